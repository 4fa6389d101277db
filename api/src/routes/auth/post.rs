use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use db::models::user::{Model as User, UserRole};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::generate_jwt;
use crate::response::ApiResponse;
use crate::routes::common::format_validation_errors;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Default)]
pub struct LoginResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub token: String,
    pub expires_at: String,
}

/// POST /auth/login
///
/// ### Request Body
/// ```json
/// { "username": "u20000001", "password": "secret123" }
/// ```
///
/// ### Responses
/// - `200 OK` with a bearer token and its expiry
/// - `400 Bad Request` on missing fields
/// - `401 Unauthorized` on unknown user or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<LoginResponse>::error(error_message)),
        );
    }

    let user = match User::verify_credentials(state.db(), &req.username, &req.password).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::info!(username = %req.username, "Failed login");
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Invalid username or password")),
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Login lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Internal server error")),
            );
        }
    };

    let role: UserRole = user.role;
    match generate_jwt(user.id, role) {
        Ok((token, expires_at)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                LoginResponse {
                    id: user.id,
                    username: user.username,
                    email: user.email,
                    role: role.to_string(),
                    token,
                    expires_at,
                },
                "Login successful",
            )),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Token encoding failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Internal server error")),
            )
        }
    }
}
