use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::enums::ContractStatus;
use crate::lifecycle::TransitionError;
use crate::reports::ReportError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Cannot change contract from {from} to {to}: {reason}")]
    InvalidTransition {
        from: ContractStatus,
        to: ContractStatus,
        reason: String,
    },
    #[error("User already exists: {0}")]
    UserAlreadyExists(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    PasswordHashingError(String),
    #[error("JWT creation failed: {0}")]
    TokenCreationError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::UserAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::PasswordHashingError(_)
            | AppError::TokenCreationError(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = serde_json::json!({ "error": self.to_string() });
        if let AppError::InvalidTransition { from, to, .. } = &self {
            body["from"] = serde_json::json!(from);
            body["to"] = serde_json::json!(to);
        }
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed with a server error.");
        }
        (status, Json(body)).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        if is_unique_violation(&err) {
            return AppError::Conflict("A record with the same unique value already exists.".to_string());
        }
        AppError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalServerError(format!("JSON serialization/deserialization error: {err}"))
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::SameState(status) => AppError::InvalidTransition {
                from: status,
                to: status,
                reason: format!("contract is already {status}"),
            },
            TransitionError::NotAllowed { from, to, reason } => AppError::InvalidTransition { from, to, reason },
            TransitionError::RoomOccupied { from, to } => AppError::InvalidTransition {
                from,
                to,
                reason: "room already has an active contract".to_string(),
            },
            TransitionError::RoomUnderMaintenance { from, to } => AppError::InvalidTransition {
                from,
                to,
                reason: "room is under maintenance".to_string(),
            },
        }
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

/// True when the database rejected a write because of a unique index.
pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    match err {
        sea_orm::DbErr::Query(sea_orm::RuntimeErr::SqlxError(sqlx::Error::Database(database_error)))
        | sea_orm::DbErr::Exec(sea_orm::RuntimeErr::SqlxError(sqlx::Error::Database(database_error))) => {
            database_error.is_unique_violation()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        assert_eq!(AppError::InvalidInput("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InvalidTransition {
                from: ContractStatus::Expired,
                to: ContractStatus::Active,
                reason: "x".into()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::DatabaseError("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn transition_errors_convert() {
        let err: AppError = TransitionError::SameState(ContractStatus::Active).into();
        assert!(matches!(
            err,
            AppError::InvalidTransition { from: ContractStatus::Active, to: ContractStatus::Active, .. }
        ));
        let err: AppError = TransitionError::RoomUnderMaintenance {
            from: ContractStatus::Terminated,
            to: ContractStatus::Active,
        }
        .into();
        assert!(matches!(
            err,
            AppError::InvalidTransition { from: ContractStatus::Terminated, to: ContractStatus::Active, .. }
        ));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.to_string().contains("maintenance"));
    }

    #[test]
    fn report_overflow_is_a_server_error() {
        let err: AppError = ReportError::AmountOverflow {
            scope: "2024-01".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("2024-01"));
    }

    #[test]
    fn plain_db_errors_are_internal() {
        let err: AppError = sea_orm::DbErr::Custom("boom".into()).into();
        assert!(matches!(err, AppError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn transition_error_body_names_the_pair() {
        let response = AppError::InvalidTransition {
            from: ContractStatus::Pending,
            to: ContractStatus::Terminated,
            reason: "only active contracts can be checked out".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["from"], "PENDING");
        assert_eq!(body["to"], "TERMINATED");
        assert!(body["error"].as_str().unwrap().contains("checked out"));
    }
}
