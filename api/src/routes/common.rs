//! Helpers shared by route handlers.

use axum::http::StatusCode;
use services::check_in::CheckInError;
use services::session_lifecycle::LifecycleError;
use validator::ValidationErrors;

/// Joins every field message of a failed `validator` check into one line.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| {
            errs.iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn check_in_status(err: &CheckInError) -> StatusCode {
    match err {
        CheckInError::InvalidSession => StatusCode::NOT_FOUND,
        CheckInError::NotStarted => StatusCode::CONFLICT,
        CheckInError::WindowClosed => StatusCode::FORBIDDEN,
        CheckInError::AlreadyMarked => StatusCode::CONFLICT,
        CheckInError::VerificationFailed => StatusCode::UNPROCESSABLE_ENTITY,
        CheckInError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn lifecycle_status(err: &LifecycleError) -> StatusCode {
    match err {
        LifecycleError::NotFound => StatusCode::NOT_FOUND,
        LifecycleError::Forbidden => StatusCode::FORBIDDEN,
        LifecycleError::NotEnrolled => StatusCode::NOT_FOUND,
        LifecycleError::InvalidTransition { .. } => StatusCode::CONFLICT,
        LifecycleError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message shown to the client. Storage details stay in the logs.
pub fn client_message<E: std::fmt::Display>(err: &E, status: StatusCode) -> String {
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "Request failed");
        "Internal server error".to_string()
    } else {
        err.to_string()
    }
}
