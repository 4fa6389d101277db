use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Local, Utc};
use db::models::{attendance_record::Model as AttendanceRecord, session_instance::Model as SessionInstance};
use serde::Serialize;
use services::{
    check_in::check_in_with_provider,
    session_lifecycle::{self, EndedSession},
};

use crate::routes::common::{check_in_status, client_message, lifecycle_status};
use crate::auth::{AuthUser, guards::actor_for};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize, Default)]
pub struct CheckInResponse {
    pub record_id: i64,
    pub session_instance_id: i64,
    pub status: String,
    pub check_in_time: Option<DateTime<Utc>>,
    pub confidence: Option<f64>,
}

impl From<AttendanceRecord> for CheckInResponse {
    fn from(r: AttendanceRecord) -> Self {
        Self {
            record_id: r.id,
            session_instance_id: r.session_instance_id,
            status: r.status.to_string(),
            check_in_time: r.check_in_time,
            confidence: r.confidence,
        }
    }
}

/// POST /api/sessions/{session_id}/check-in
///
/// Multipart body with one `image` part holding the captured face sample.
///
/// ### Responses
/// - `201 Created` → the stored `present` record
/// - `400 Bad Request` → no image part
/// - `404 Not Found` → session missing, not today, or student not enrolled
/// - `409 Conflict` → session not started, or attendance already recorded
/// - `403 Forbidden` → check-in window closed
/// - `422 Unprocessable Entity` → face verification failed
pub async fn check_in(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> (StatusCode, Json<ApiResponse<CheckInResponse>>) {
    let mut image: Option<Vec<u8>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed check-in upload");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error("Invalid multipart body")),
                );
            }
        };

        if field.name() == Some("image") {
            match field.bytes().await {
                Ok(bytes) => image = Some(bytes.to_vec()),
                Err(_) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ApiResponse::error("Failed to read image")),
                    );
                }
            }
        }
    }

    let Some(image) = image.filter(|b| !b.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("No image provided")),
        );
    };

    match check_in_with_provider(
        state.db(),
        state.verifier(),
        user.id(),
        session_id,
        &image,
        Local::now(),
        state.policy(),
    )
    .await
    {
        Ok(record) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                CheckInResponse::from(record),
                "Attendance recorded",
            )),
        ),
        Err(e) => {
            let status = check_in_status(&e);
            (status, Json(ApiResponse::error(client_message(&e, status))))
        }
    }
}

/// POST /api/sessions/{session_id}/start
///
/// Lecturer assigned to the class (or an admin) starts a `scheduled` session.
pub async fn start_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Option<SessionInstance>>>) {
    match session_lifecycle::start_session(state.db(), actor_for(&user), session_id, Utc::now())
        .await
    {
        Ok(instance) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(instance), "Session started")),
        ),
        Err(e) => {
            let status = lifecycle_status(&e);
            (status, Json(ApiResponse::error(client_message(&e, status))))
        }
    }
}

/// POST /api/sessions/{session_id}/end
///
/// Completes an `in_progress` session and records everyone who didn't check in as absent.
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Option<EndedSession>>>) {
    match session_lifecycle::end_session(state.db(), actor_for(&user), session_id, Utc::now()).await
    {
        Ok(ended) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(ended), "Session ended")),
        ),
        Err(e) => {
            let status = lifecycle_status(&e);
            (status, Json(ApiResponse::error(client_message(&e, status))))
        }
    }
}
