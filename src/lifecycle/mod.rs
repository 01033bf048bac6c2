//! Contract status engine.
//!
//! Pure functions only: date derivations, the transition table and the
//! final-bill arithmetic. Persistence lives in `db::services::contract_service`.

pub mod derivation;
pub mod final_bill;
pub mod transition;

pub use derivation::{
    contract_duration, effective_badge, is_expired, is_expiring_soon, remaining_days, ContractBadge,
    ContractTimeline, DEFAULT_EXPIRING_SOON_DAYS,
};
pub use final_bill::{final_bill_draft, FinalBillDraft};
pub use transition::{
    action_for_target, plan_transition, ContractSnapshot, TransitionAction, TransitionError, TransitionPlan,
    TransitionPolicy,
};
