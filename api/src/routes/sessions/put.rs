use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use db::models::attendance_record::{AttendanceStatus, Model as AttendanceRecord};
use serde::Deserialize;
use services::attendance;
use validator::Validate;

use crate::auth::{AuthUser, guards::actor_for};
use crate::response::ApiResponse;
use crate::routes::common::{client_message, format_validation_errors, lifecycle_status};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRecordRequest {
    pub status: AttendanceStatus,

    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// PUT /api/sessions/{session_id}/records/{student_id}
///
/// Lecturer assigned to the class (or an admin) sets a student's status by hand.
/// Creates the record if the student has none yet; `notes` replaces earlier notes
/// only when present.
///
/// **Body**
/// ```json
/// { "status": "late", "notes": "Doctor's appointment" }
/// ```
pub async fn update_record(
    State(state): State<AppState>,
    Path((session_id, student_id)): Path<(i64, i64)>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateRecordRequest>,
) -> (StatusCode, Json<ApiResponse<Option<AttendanceRecord>>>) {
    if let Err(errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(&errors))),
        );
    }

    match attendance::override_status(
        state.db(),
        actor_for(&user),
        session_id,
        student_id,
        req.status,
        req.notes,
        Utc::now(),
    )
    .await
    {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(record), "Attendance updated")),
        ),
        Err(e) => {
            let status = lifecycle_status(&e);
            (status, Json(ApiResponse::error(client_message(&e, status))))
        }
    }
}
