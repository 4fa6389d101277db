use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{Local, NaiveDate, NaiveTime};
use db::models::{
    class, class_lecturer, student_enrollment,
    timetable_session::{self, Weekday},
    user::{self, UserRole},
};
use serde::{Deserialize, Serialize};
use services::session_lifecycle;
use validator::Validate;

use super::common::{db_error, fail, require_class, require_user_with_role};
use crate::response::ApiResponse;
use crate::routes::common::format_validation_errors;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub role: UserRole,
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> (StatusCode, Json<ApiResponse<Option<user::Model>>>) {
    if let Err(errors) = req.validate() {
        return fail((StatusCode::BAD_REQUEST, format_validation_errors(&errors)));
    }

    match user::Model::create(state.db(), &req.username, &req.email, &req.password, req.role).await
    {
        Ok(u) => {
            tracing::info!(user = u.id, role = %u.role, "User created");
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(Some(u), "User created")),
            )
        }
        Err(e) => fail(db_error(&e, "User")),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassRequest {
    #[validate(length(min = 1, max = 32, message = "Class code must be 1-32 characters"))]
    pub class_code: String,

    #[validate(length(min = 1, message = "Class name is required"))]
    pub class_name: String,
}

/// POST /api/admin/classes
pub async fn create_class(
    State(state): State<AppState>,
    Json(req): Json<CreateClassRequest>,
) -> (StatusCode, Json<ApiResponse<Option<class::Model>>>) {
    if let Err(errors) = req.validate() {
        return fail((StatusCode::BAD_REQUEST, format_validation_errors(&errors)));
    }

    match class::Model::create(state.db(), &req.class_code, &req.class_name).await {
        Ok(c) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(Some(c), "Class created")),
        ),
        Err(e) => fail(db_error(&e, "Class")),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTimetableRequest {
    #[validate(length(min = 1, message = "Session title is required"))]
    pub session_title: String,
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// POST /api/admin/classes/{class_id}/timetable
///
/// ```json
/// { "session_title": "Lecture", "day_of_week": "monday", "start_time": "09:00:00", "end_time": "10:00:00" }
/// ```
pub async fn create_timetable_session(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(req): Json<CreateTimetableRequest>,
) -> (StatusCode, Json<ApiResponse<Option<timetable_session::Model>>>) {
    if let Err(errors) = req.validate() {
        return fail((StatusCode::BAD_REQUEST, format_validation_errors(&errors)));
    }
    if let Err(e) = require_class(state.db(), class_id).await {
        return fail(e);
    }

    match timetable_session::Model::create(
        state.db(),
        class_id,
        &req.session_title,
        req.day_of_week,
        req.start_time,
        req.end_time,
    )
    .await
    {
        Ok(slot) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(Some(slot), "Timetable session created")),
        ),
        Err(e) => fail(db_error(&e, "Timetable session")),
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignLecturerRequest {
    pub lecturer_id: i64,
}

#[derive(Debug, Serialize, Default)]
pub struct Assignment {
    pub class_id: i64,
    pub lecturer_id: i64,
}

/// POST /api/admin/classes/{class_id}/lecturers
pub async fn assign_lecturer(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(req): Json<AssignLecturerRequest>,
) -> (StatusCode, Json<ApiResponse<Assignment>>) {
    let db = state.db();
    if let Err(e) = require_class(db, class_id).await {
        return fail(e);
    }
    if let Err(e) = require_user_with_role(db, req.lecturer_id, UserRole::Lecturer).await {
        return fail(e);
    }

    match class_lecturer::Model::assign(db, class_id, req.lecturer_id).await {
        Ok(row) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                Assignment {
                    class_id: row.class_id,
                    lecturer_id: row.lecturer_id,
                },
                "Lecturer assigned",
            )),
        ),
        Err(e) => fail(db_error(&e, "Assignment")),
    }
}

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub student_id: i64,
}

/// POST /api/admin/classes/{class_id}/students
///
/// Enrolls a student, or re-enrolls one who was dropped.
pub async fn enroll_student(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(req): Json<EnrollRequest>,
) -> (StatusCode, Json<ApiResponse<Option<student_enrollment::Model>>>) {
    let db = state.db();
    if let Err(e) = require_class(db, class_id).await {
        return fail(e);
    }
    if let Err(e) = require_user_with_role(db, req.student_id, UserRole::Student).await {
        return fail(e);
    }

    match student_enrollment::Model::enroll(db, req.student_id, class_id).await {
        Ok(row) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(row), "Student enrolled")),
        ),
        Err(e) => fail(db_error(&e, "Enrollment")),
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct MaterializeRequest {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Default)]
pub struct MaterializeResponse {
    pub date: Option<NaiveDate>,
    pub created: u64,
}

/// POST /api/admin/materialize
///
/// Creates the `scheduled` session instances for `date` (default: today).
/// Existing instances are left untouched, so repeating the call is harmless.
pub async fn materialize(
    State(state): State<AppState>,
    body: Option<Json<MaterializeRequest>>,
) -> (StatusCode, Json<ApiResponse<MaterializeResponse>>) {
    let date = body
        .and_then(|Json(b)| b.date)
        .unwrap_or_else(|| Local::now().date_naive());

    match session_lifecycle::materialize_day(state.db(), date).await {
        Ok(created) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                MaterializeResponse {
                    date: Some(date),
                    created,
                },
                format!("Created {created} session instance(s)"),
            )),
        ),
        Err(e) => fail(db_error(&e, "Session instances")),
    }
}
