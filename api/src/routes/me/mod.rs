//! `/me` route group: the calling student's own attendance.
//!
//! - `GET /me/attendance?status=` → summary plus history, newest session first

use crate::state::AppState;
use axum::{Router, routing::get};

mod get;

pub use get::attendance_history;

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/attendance", get(attendance_history))
}
