use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, Empty};
use axum::{
    Json,
    body::Body,
    extract::FromRequestParts,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::user::UserRole;
use once_cell::sync::Lazy;
use services::session_lifecycle::Actor;
use std::collections::HashSet;
use util::config;

// --- Superuser ---

/// User IDs from `SUPER_USERS`. They pass every role guard.
pub static SUPERUSER_IDS: Lazy<HashSet<i64>> =
    Lazy::new(|| config::super_users().into_iter().collect());

pub fn is_superuser(user_id: i64) -> bool {
    SUPERUSER_IDS.contains(&user_id)
}

/// The caller as seen by the session lifecycle rules. Superusers act as admins.
pub fn actor_for(user: &AuthUser) -> Actor {
    let role = if is_superuser(user.id()) {
        UserRole::Admin
    } else {
        user.role()
    };
    Actor {
        user_id: user.id(),
        role,
    }
}

type GuardError = (StatusCode, Json<ApiResponse<Empty>>);

/// Validates the bearer token and stores the `AuthUser` in the request extensions
/// so handlers can take it with `Extension<AuthUser>`.
async fn extract_and_insert_authuser(
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), GuardError> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

async fn allow_roles(
    req: Request<Body>,
    next: Next,
    roles: &[UserRole],
    failure_msg: &str,
) -> Result<Response, GuardError> {
    let (req, user) = extract_and_insert_authuser(req).await?;

    if !roles.contains(&user.role()) && !is_superuser(user.id()) {
        tracing::debug!(user = user.id(), role = %user.role(), "Role guard denied request");
        return Err((StatusCode::FORBIDDEN, Json(ApiResponse::error(failure_msg))));
    }

    Ok(next.run(req).await)
}

/// Admin-only guard.
pub async fn allow_admin(req: Request<Body>, next: Next) -> Result<Response, GuardError> {
    allow_roles(req, next, &[UserRole::Admin], "Admin access required").await
}

/// Lecturers and admins. Class assignment is checked by the handler.
pub async fn allow_lecturer(req: Request<Body>, next: Next) -> Result<Response, GuardError> {
    allow_roles(
        req,
        next,
        &[UserRole::Lecturer, UserRole::Admin],
        "Lecturer access required",
    )
    .await
}

pub async fn allow_student(req: Request<Body>, next: Next) -> Result<Response, GuardError> {
    allow_roles(req, next, &[UserRole::Student], "Student access required").await
}
