//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → health check (public)
//! - `/auth` → login (public)
//! - `/sessions` → check-in, lecturer start/end, session rolls (authenticated, per-route roles)
//! - `/me` → the calling student's own attendance
//! - `/admin` → users, classes, timetable, enrollment, materialisation (admin-only)

use crate::auth::guards::{allow_admin, allow_student};
use crate::routes::{
    admin::admin_routes, auth::auth_routes, health::health_routes, me::me_routes,
    sessions::sessions_routes,
};
use crate::state::AppState;
use axum::{Router, middleware::from_fn};

pub mod admin;
pub mod auth;
pub mod common;
pub mod health;
pub mod me;
pub mod sessions;

/// Builds the complete `/api` router. Role guards are applied per group here,
/// or per route inside `sessions`, where students and lecturers share a prefix.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes())
        .nest("/sessions", sessions_routes())
        .nest("/me", me_routes().route_layer(from_fn(allow_student)))
        .nest("/admin", admin_routes().route_layer(from_fn(allow_admin)))
        .with_state(app_state)
}
