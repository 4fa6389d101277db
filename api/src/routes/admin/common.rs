use crate::response::ApiResponse;
use axum::{Json, http::StatusCode};
use db::models::{
    class,
    user::{self, UserRole},
};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use serde::Serialize;

/// Status and message for a failed admin write.
pub fn db_error(e: &DbErr, what: &str) -> (StatusCode, String) {
    if db::is_unique_violation(e) {
        (StatusCode::CONFLICT, format!("{what} already exists"))
    } else if let DbErr::Custom(msg) = e {
        (StatusCode::BAD_REQUEST, msg.clone())
    } else {
        tracing::error!(error = %e, "Admin write failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to save {}", what.to_lowercase()),
        )
    }
}

pub async fn require_class(
    db: &DatabaseConnection,
    class_id: i64,
) -> Result<class::Model, (StatusCode, String)> {
    match class::Entity::find_by_id(class_id).one(db).await {
        Ok(Some(c)) => Ok(c),
        Ok(None) => Err((StatusCode::NOT_FOUND, format!("Class {class_id} not found"))),
        Err(e) => Err(db_error(&e, "Class")),
    }
}

/// Loads a user and checks it has `role`.
pub async fn require_user_with_role(
    db: &DatabaseConnection,
    user_id: i64,
    role: UserRole,
) -> Result<user::Model, (StatusCode, String)> {
    match user::Entity::find_by_id(user_id).one(db).await {
        Ok(Some(u)) if u.role == role => Ok(u),
        Ok(Some(_)) => Err((
            StatusCode::BAD_REQUEST,
            format!("User {user_id} is not a {role}"),
        )),
        Ok(None) => Err((StatusCode::NOT_FOUND, format!("User {user_id} not found"))),
        Err(e) => Err(db_error(&e, "User")),
    }
}

pub fn fail<T>(err: (StatusCode, String)) -> (StatusCode, Json<ApiResponse<T>>)
where
    T: Serialize + Default,
{
    let (status, message) = err;
    (status, Json(ApiResponse::error(message)))
}
