use chrono::NaiveDate;
use thiserror::Error;

use super::derivation::is_expired;
use crate::db::enums::{ContractStatus, RoomStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionAction {
    CheckIn,
    CheckOut { reason: Option<String> },
    MarkExpired { reason: Option<String> },
    Reactivate,
}

impl TransitionAction {
    pub fn target(&self) -> ContractStatus {
        match self {
            TransitionAction::CheckIn | TransitionAction::Reactivate => ContractStatus::Active,
            TransitionAction::CheckOut { .. } => ContractStatus::Terminated,
            TransitionAction::MarkExpired { .. } => ContractStatus::Expired,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransitionAction::CheckIn => "check_in",
            TransitionAction::CheckOut { .. } => "check_out",
            TransitionAction::MarkExpired { .. } => "mark_expired",
            TransitionAction::Reactivate => "reactivate",
        }
    }
}

/// Which re-activations are permitted. Leaving a terminated or expired
/// lease is normally final, so each path is a deliberate switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPolicy {
    pub allow_reactivate_terminated: bool,
    pub allow_reactivate_expired: bool,
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self {
            allow_reactivate_terminated: true,
            allow_reactivate_expired: false,
        }
    }
}

/// The state a transition is validated against, read inside the same
/// transaction that will write the result.
#[derive(Debug, Clone)]
pub struct ContractSnapshot {
    pub status: ContractStatus,
    pub end_date: NaiveDate,
    pub room_status: RoomStatus,
    /// Another contract on the same room is currently ACTIVE.
    pub room_has_other_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub from: ContractStatus,
    pub to: ContractStatus,
    pub room_status: RoomStatus,
    pub reason: Option<String>,
    pub marks_check_in: bool,
    pub marks_termination: bool,
    pub issue_final_bill: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Contract is already {0}")]
    SameState(ContractStatus),
    #[error("Transition from {from} to {to} is not allowed: {reason}")]
    NotAllowed {
        from: ContractStatus,
        to: ContractStatus,
        reason: String,
    },
    #[error("Transition from {from} to {to} is not allowed: room already has an active contract")]
    RoomOccupied { from: ContractStatus, to: ContractStatus },
    #[error("Transition from {from} to {to} is not allowed: room is under maintenance")]
    RoomUnderMaintenance { from: ContractStatus, to: ContractStatus },
}

fn not_allowed(from: ContractStatus, to: ContractStatus, reason: &str) -> TransitionError {
    TransitionError::NotAllowed {
        from,
        to,
        reason: reason.to_string(),
    }
}

/// Maps a requested target status onto the transition that reaches it.
pub fn action_for_target(
    from: ContractStatus,
    to: ContractStatus,
    reason: Option<String>,
) -> Result<TransitionAction, TransitionError> {
    if from == to {
        return Err(TransitionError::SameState(from));
    }
    match to {
        ContractStatus::Active if from == ContractStatus::Pending => Ok(TransitionAction::CheckIn),
        ContractStatus::Active => Ok(TransitionAction::Reactivate),
        ContractStatus::Terminated => Ok(TransitionAction::CheckOut { reason }),
        ContractStatus::Expired => Ok(TransitionAction::MarkExpired { reason }),
        ContractStatus::Pending => Err(not_allowed(from, to, "a contract cannot return to pending")),
    }
}

fn check_reactivation(from: ContractStatus, policy: &TransitionPolicy) -> Result<(), TransitionError> {
    let to = ContractStatus::Active;
    match from {
        ContractStatus::Terminated if policy.allow_reactivate_terminated => Ok(()),
        ContractStatus::Terminated => Err(not_allowed(from, to, "terminated contracts cannot be reactivated")),
        ContractStatus::Expired if policy.allow_reactivate_expired => Ok(()),
        ContractStatus::Expired => Err(not_allowed(from, to, "expired contracts cannot be reactivated")),
        ContractStatus::Pending => Err(not_allowed(from, to, "pending contracts must be checked in")),
        ContractStatus::Active => Err(TransitionError::SameState(from)),
    }
}

fn check_room_free(snapshot: &ContractSnapshot, to: ContractStatus) -> Result<(), TransitionError> {
    let from = snapshot.status;
    if snapshot.room_has_other_active {
        return Err(TransitionError::RoomOccupied { from, to });
    }
    if snapshot.room_status == RoomStatus::Maintenance {
        return Err(TransitionError::RoomUnderMaintenance { from, to });
    }
    Ok(())
}

/// Validates `action` against the snapshot and describes the writes that
/// apply it. Never mutates anything.
pub fn plan_transition(
    action: &TransitionAction,
    snapshot: &ContractSnapshot,
    today: NaiveDate,
    policy: &TransitionPolicy,
) -> Result<TransitionPlan, TransitionError> {
    let from = snapshot.status;
    let to = action.target();
    if from == to {
        return Err(TransitionError::SameState(from));
    }

    match action {
        TransitionAction::CheckIn | TransitionAction::Reactivate => {
            if matches!(action, TransitionAction::Reactivate) || from != ContractStatus::Pending {
                check_reactivation(from, policy)?;
            }
            if is_expired(snapshot.end_date, today) {
                return Err(not_allowed(from, to, "cannot check in an expired contract"));
            }
            check_room_free(snapshot, to)?;
            Ok(TransitionPlan {
                from,
                to,
                room_status: RoomStatus::Occupied,
                reason: None,
                marks_check_in: true,
                marks_termination: false,
                issue_final_bill: false,
            })
        }
        TransitionAction::CheckOut { reason } => {
            if from != ContractStatus::Active {
                return Err(not_allowed(from, to, "only active contracts can be checked out"));
            }
            Ok(TransitionPlan {
                from,
                to,
                room_status: RoomStatus::Available,
                reason: reason.clone(),
                marks_check_in: false,
                marks_termination: true,
                issue_final_bill: true,
            })
        }
        TransitionAction::MarkExpired { reason } => {
            if from != ContractStatus::Active {
                return Err(not_allowed(from, to, "only active contracts can expire"));
            }
            if !is_expired(snapshot.end_date, today) {
                return Err(not_allowed(from, to, "the end date has not passed yet"));
            }
            Ok(TransitionPlan {
                from,
                to,
                room_status: RoomStatus::Available,
                reason: reason.clone(),
                marks_check_in: false,
                marks_termination: false,
                issue_final_bill: false,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn snapshot(status: ContractStatus, end_date: NaiveDate) -> ContractSnapshot {
        ContractSnapshot {
            status,
            end_date,
            room_status: RoomStatus::Available,
            room_has_other_active: false,
        }
    }

    const TODAY: (i32, u32, u32) = (2024, 3, 10);

    fn today() -> NaiveDate {
        d(TODAY.0, TODAY.1, TODAY.2)
    }

    #[test]
    fn check_in_pending_contract_occupies_room() {
        let plan = plan_transition(
            &TransitionAction::CheckIn,
            &snapshot(ContractStatus::Pending, d(2024, 12, 31)),
            today(),
            &TransitionPolicy::default(),
        )
        .unwrap();
        assert_eq!(plan.to, ContractStatus::Active);
        assert_eq!(plan.room_status, RoomStatus::Occupied);
        assert!(plan.marks_check_in);
    }

    #[test]
    fn check_in_terminated_contract_with_future_end_succeeds() {
        let plan = plan_transition(
            &TransitionAction::CheckIn,
            &snapshot(ContractStatus::Terminated, d(2024, 12, 31)),
            today(),
            &TransitionPolicy::default(),
        )
        .unwrap();
        assert_eq!(plan.from, ContractStatus::Terminated);
        assert_eq!(plan.room_status, RoomStatus::Occupied);
    }

    #[test]
    fn check_in_past_end_date_is_rejected() {
        let err = plan_transition(
            &TransitionAction::CheckIn,
            &snapshot(ContractStatus::Pending, d(2024, 3, 9)),
            today(),
            &TransitionPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TransitionError::NotAllowed { from: ContractStatus::Pending, to: ContractStatus::Active, .. }
        ));
    }

    #[test]
    fn check_in_on_last_day_is_allowed() {
        assert!(plan_transition(
            &TransitionAction::CheckIn,
            &snapshot(ContractStatus::Pending, today()),
            today(),
            &TransitionPolicy::default(),
        )
        .is_ok());
    }

    #[test]
    fn check_in_active_contract_is_a_self_transition() {
        let err = plan_transition(
            &TransitionAction::CheckIn,
            &snapshot(ContractStatus::Active, d(2024, 12, 31)),
            today(),
            &TransitionPolicy::default(),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::SameState(ContractStatus::Active));
    }

    #[test]
    fn check_in_respects_room_state() {
        let mut snap = snapshot(ContractStatus::Pending, d(2024, 12, 31));
        snap.room_has_other_active = true;
        assert_eq!(
            plan_transition(&TransitionAction::CheckIn, &snap, today(), &TransitionPolicy::default()),
            Err(TransitionError::RoomOccupied {
                from: ContractStatus::Pending,
                to: ContractStatus::Active
            })
        );

        snap.room_has_other_active = false;
        snap.room_status = RoomStatus::Maintenance;
        assert_eq!(
            plan_transition(&TransitionAction::CheckIn, &snap, today(), &TransitionPolicy::default()),
            Err(TransitionError::RoomUnderMaintenance {
                from: ContractStatus::Pending,
                to: ContractStatus::Active
            })
        );
    }

    #[test]
    fn check_out_requires_active() {
        for status in [ContractStatus::Pending, ContractStatus::Expired] {
            let err = plan_transition(
                &TransitionAction::CheckOut { reason: None },
                &snapshot(status, d(2024, 12, 31)),
                today(),
                &TransitionPolicy::default(),
            )
            .unwrap_err();
            assert!(matches!(err, TransitionError::NotAllowed { .. }), "{status}");
        }
        assert_eq!(
            plan_transition(
                &TransitionAction::CheckOut { reason: None },
                &snapshot(ContractStatus::Terminated, d(2024, 12, 31)),
                today(),
                &TransitionPolicy::default(),
            ),
            Err(TransitionError::SameState(ContractStatus::Terminated))
        );
    }

    #[test]
    fn check_out_active_frees_room_and_bills() {
        let plan = plan_transition(
            &TransitionAction::CheckOut {
                reason: Some("moving abroad".into()),
            },
            &snapshot(ContractStatus::Active, d(2024, 12, 31)),
            today(),
            &TransitionPolicy::default(),
        )
        .unwrap();
        assert_eq!(plan.to, ContractStatus::Terminated);
        assert_eq!(plan.room_status, RoomStatus::Available);
        assert_eq!(plan.reason.as_deref(), Some("moving abroad"));
        assert!(plan.issue_final_bill);
        assert!(plan.marks_termination);
    }

    #[test]
    fn mark_expired_only_after_end_date() {
        let action = TransitionAction::MarkExpired { reason: None };
        let policy = TransitionPolicy::default();
        assert!(plan_transition(&action, &snapshot(ContractStatus::Active, d(2024, 3, 10)), today(), &policy).is_err());
        let plan = plan_transition(&action, &snapshot(ContractStatus::Active, d(2024, 3, 9)), today(), &policy).unwrap();
        assert_eq!(plan.to, ContractStatus::Expired);
        assert_eq!(plan.room_status, RoomStatus::Available);
        assert!(plan_transition(&action, &snapshot(ContractStatus::Pending, d(2024, 3, 1)), today(), &policy).is_err());
    }

    #[test]
    fn reactivation_follows_policy() {
        let strict = TransitionPolicy {
            allow_reactivate_terminated: false,
            allow_reactivate_expired: false,
        };
        let lenient = TransitionPolicy {
            allow_reactivate_terminated: true,
            allow_reactivate_expired: true,
        };
        let terminated = snapshot(ContractStatus::Terminated, d(2024, 12, 31));
        let expired = snapshot(ContractStatus::Expired, d(2024, 12, 31));

        assert!(plan_transition(&TransitionAction::Reactivate, &terminated, today(), &strict).is_err());
        assert!(plan_transition(&TransitionAction::CheckIn, &terminated, today(), &strict).is_err());
        assert!(plan_transition(&TransitionAction::Reactivate, &terminated, today(), &lenient).is_ok());

        assert!(plan_transition(&TransitionAction::Reactivate, &expired, today(), &TransitionPolicy::default()).is_err());
        assert!(plan_transition(&TransitionAction::Reactivate, &expired, today(), &lenient).is_ok());
    }

    #[test]
    fn reactivate_pending_points_to_check_in() {
        let err = plan_transition(
            &TransitionAction::Reactivate,
            &snapshot(ContractStatus::Pending, d(2024, 12, 31)),
            today(),
            &TransitionPolicy::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("checked in"));
    }

    #[test]
    fn target_mapping() {
        assert_eq!(
            action_for_target(ContractStatus::Pending, ContractStatus::Active, None),
            Ok(TransitionAction::CheckIn)
        );
        assert_eq!(
            action_for_target(ContractStatus::Terminated, ContractStatus::Active, None),
            Ok(TransitionAction::Reactivate)
        );
        assert_eq!(
            action_for_target(ContractStatus::Active, ContractStatus::Terminated, Some("x".into())),
            Ok(TransitionAction::CheckOut { reason: Some("x".into()) })
        );
        assert_eq!(
            action_for_target(ContractStatus::Active, ContractStatus::Active, None),
            Err(TransitionError::SameState(ContractStatus::Active))
        );
        assert!(action_for_target(ContractStatus::Active, ContractStatus::Pending, None).is_err());
    }

    #[test]
    fn rejection_names_the_pair() {
        let err = plan_transition(
            &TransitionAction::CheckOut { reason: None },
            &snapshot(ContractStatus::Expired, d(2024, 1, 1)),
            today(),
            &TransitionPolicy::default(),
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("EXPIRED") && msg.contains("TERMINATED"), "{msg}");
    }
}
