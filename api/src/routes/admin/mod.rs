//! `/admin` route group (admin-only, guarded in `routes()`).
//!
//! - `POST   /admin/users` → create a user with a role
//! - `POST   /admin/classes` → create a class
//! - `POST   /admin/classes/{class_id}/timetable` → add a weekly slot
//! - `POST   /admin/classes/{class_id}/lecturers` → assign a lecturer
//! - `POST   /admin/classes/{class_id}/students` → enroll a student
//! - `DELETE /admin/classes/{class_id}/students/{student_id}` → drop a student
//! - `POST   /admin/materialize` → create the session instances for a day

use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, post},
};

mod common;
mod delete;
mod post;

pub use delete::drop_student;
pub use post::{
    assign_lecturer, create_class, create_timetable_session, create_user, enroll_student,
    materialize,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/classes", post(create_class))
        .route("/classes/{class_id}/timetable", post(create_timetable_session))
        .route("/classes/{class_id}/lecturers", post(assign_lecturer))
        .route("/classes/{class_id}/students", post(enroll_student))
        .route("/classes/{class_id}/students/{student_id}", delete(drop_student))
        .route("/materialize", post(materialize))
}
