//! `/sessions` route group.
//!
//! Students and lecturers share this prefix, so each route carries its own guard:
//! - `GET  /sessions/available?date=YYYY-MM-DD` → today's (or `date`'s) sessions for the student
//! - `GET  /sessions/{session_id}/status` → whether the student is already marked
//! - `POST /sessions/{session_id}/check-in` → multipart `image` upload, face-verified check-in
//! - `POST /sessions/{session_id}/start` / `end` → lecturer lifecycle
//! - `GET  /sessions/{session_id}/records` (+ `/export`) → session roll as JSON or CSV
//! - `PUT  /sessions/{session_id}/records/{student_id}` → staff sets a student's status by hand

use crate::auth::guards::{allow_lecturer, allow_student};
use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post, put},
};

mod get;
mod post;
mod put;

pub use get::{export_records_csv, get_status, list_available, list_records};
pub use post::{check_in, end_session, start_session};
pub use put::update_record;

/// Upper bound on a check-in upload.
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub fn sessions_routes() -> Router<AppState> {
    Router::new()
        .route("/available", get(list_available).route_layer(from_fn(allow_student)))
        .route("/{session_id}/status", get(get_status).route_layer(from_fn(allow_student)))
        .route(
            "/{session_id}/check-in",
            post(check_in)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
                .route_layer(from_fn(allow_student)),
        )
        .route("/{session_id}/start", post(start_session).route_layer(from_fn(allow_lecturer)))
        .route("/{session_id}/end", post(end_session).route_layer(from_fn(allow_lecturer)))
        .route("/{session_id}/records", get(list_records).route_layer(from_fn(allow_lecturer)))
        .route(
            "/{session_id}/records/export",
            get(export_records_csv).route_layer(from_fn(allow_lecturer)),
        )
        .route(
            "/{session_id}/records/{student_id}",
            put(update_record).route_layer(from_fn(allow_lecturer)),
        )
}
