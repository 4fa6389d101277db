//! `/auth` route group.

pub mod post;

use crate::state::AppState;
use axum::{Router, routing::post};
use post::login;

/// - `POST /auth/login` → `login`
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}
