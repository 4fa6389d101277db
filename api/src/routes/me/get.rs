use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use db::models::attendance_record::AttendanceStatus;
use serde::Deserialize;
use services::attendance::{MyAttendance, my_attendance};

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub status: Option<AttendanceStatus>,
}

/// GET /api/me/attendance?status=present|late|absent
///
/// The calling student's records, newest session first, with a summary over all
/// of them. `status` filters the records but never the summary.
///
/// ### Example Response
/// ```json
/// {
///   "success": true,
///   "data": {
///     "summary": { "total": 4, "present": 3, "late": 0, "absent": 1, "percentage": 75.0 },
///     "records": [ { "session_instance_id": 12, "status": "present", "...": "..." } ]
///   },
///   "message": "Attendance history retrieved"
/// }
/// ```
pub async fn attendance_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AttendanceQuery>,
) -> (StatusCode, Json<ApiResponse<Option<MyAttendance>>>) {
    match my_attendance(state.db(), user.id(), query.status).await {
        Ok(attendance) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(attendance), "Attendance history retrieved")),
        ),
        Err(e) => {
            tracing::error!(error = %e, user = user.id(), "Failed to load attendance history");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to retrieve attendance history")),
            )
        }
    }
}
