use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::student_enrollment::{self, EnrollmentStatus};
use sea_orm::EntityTrait;

use super::common::{db_error, fail};
use crate::response::ApiResponse;
use crate::state::AppState;

/// DELETE /api/admin/classes/{class_id}/students/{student_id}
///
/// Marks the enrollment `dropped`. Existing attendance records are kept.
pub async fn drop_student(
    State(state): State<AppState>,
    Path((class_id, student_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<Option<student_enrollment::Model>>>) {
    let db = state.db();

    match student_enrollment::Entity::find_by_id((student_id, class_id)).one(db).await {
        Ok(Some(existing)) if existing.status == EnrollmentStatus::Dropped => {
            return (
                StatusCode::OK,
                Json(ApiResponse::success(Some(existing), "Student already dropped")),
            );
        }
        Ok(Some(_)) => {}
        Ok(None) => {
            return fail((
                StatusCode::NOT_FOUND,
                "Student is not enrolled in this class".to_string(),
            ));
        }
        Err(e) => return fail(db_error(&e, "Enrollment")),
    }

    match student_enrollment::Model::drop_student(db, student_id, class_id).await {
        Ok(row) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(row), "Student dropped")),
        ),
        Err(e) => fail(db_error(&e, "Enrollment")),
    }
}
