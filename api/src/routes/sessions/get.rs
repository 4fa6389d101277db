use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use services::{
    attendance::{self, AttendanceStatusView, SessionRecordRow},
    check_in::{AvailableSession, available_sessions},
    session_lifecycle::{LifecycleError, authorize},
};

use crate::auth::{AuthUser, guards::actor_for};
use crate::response::ApiResponse;
use crate::routes::common::{client_message, lifecycle_status};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailableQuery {
    pub date: Option<NaiveDate>,
}

/// GET /api/sessions/available?date=YYYY-MM-DD
///
/// Session instances on `date` (default: today) for the classes the student is
/// enrolled in, earliest first, each flagged with `checked_in`. Today's slots are
/// materialised on the way, so a slot created after startup is listed.
pub async fn list_available(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(q): Query<AvailableQuery>,
) -> (StatusCode, Json<ApiResponse<Vec<AvailableSession>>>) {
    let today = Local::now().date_naive();
    let date = q.date.unwrap_or(today);

    match available_sessions(state.db(), user.id(), date, today).await {
        Ok(sessions) => (
            StatusCode::OK,
            Json(ApiResponse::success(sessions, "Sessions retrieved")),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list available sessions");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to retrieve sessions")),
            )
        }
    }
}

/// GET /api/sessions/{session_id}/status
pub async fn get_status(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Option<AttendanceStatusView>>>) {
    match attendance::attendance_status(state.db(), user.id(), session_id).await {
        Ok(view) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(view), "Attendance status retrieved")),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read attendance status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to retrieve attendance status")),
            )
        }
    }
}

async fn load_roll(
    state: &AppState,
    user: &AuthUser,
    session_id: i64,
) -> Result<Vec<SessionRecordRow>, LifecycleError> {
    authorize(state.db(), actor_for(user), session_id).await?;
    Ok(attendance::session_records(state.db(), session_id).await?)
}

/// GET /api/sessions/{session_id}/records
pub async fn list_records(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<SessionRecordRow>>>) {
    match load_roll(&state, &user, session_id).await {
        Ok(rows) => (
            StatusCode::OK,
            Json(ApiResponse::success(rows, "Attendance records retrieved")),
        ),
        Err(e) => {
            let status = lifecycle_status(&e);
            (status, Json(ApiResponse::error(client_message(&e, status))))
        }
    }
}

/// GET /api/sessions/{session_id}/records/export
///
/// **Response**: `text/csv` attachment with columns
/// `session_instance_id,student_id,username,status,check_in_time,confidence,notes`.
pub async fn export_records_csv(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> (StatusCode, (HeaderMap, String)) {
    let mut headers = HeaderMap::new();

    let rows = match load_roll(&state, &user, session_id).await {
        Ok(rows) => rows,
        Err(e) => {
            let status = lifecycle_status(&e);
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
            return (status, (headers, client_message(&e, status)));
        }
    };

    let csv = attendance::records_csv(session_id, &rows);
    let filename = format!("attendance_session_{session_id}.csv");

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .unwrap_or(HeaderValue::from_static("attachment")),
    );

    (StatusCode::OK, (headers, csv))
}
