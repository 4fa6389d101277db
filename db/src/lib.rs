pub mod models;
pub mod test_utils;

use sea_orm::{Database, DatabaseConnection, DbErr, SqlErr};
use std::future::Future;
use util::{config, paths};

pub use sea_orm::DbErr as Error;

/// Opens the application database from `DATABASE_PATH`.
///
/// A plain file path is treated as SQLite; its parent directory is created first
/// since SQLite won't create intermediate dirs.
pub async fn connect() -> Result<DatabaseConnection, DbErr> {
    let path_or_url = config::database_path();
    if !path_or_url.contains("://") && !path_or_url.starts_with("sqlite:") {
        paths::ensure_parent_dir(&path_or_url)
            .map_err(|e| DbErr::Custom(format!("Failed to create database directory: {e}")))?;
    }

    Database::connect(paths::database_url(&path_or_url)).await
}

/// Connection-level failures that are worth one more attempt.
pub fn is_transient(err: &DbErr) -> bool {
    matches!(err, DbErr::ConnectionAcquire(_) | DbErr::Conn(_))
}

/// True when the error is a violated `UNIQUE` / primary key constraint.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Projection for operations that fail with a bare `DbErr`.
pub fn as_storage(err: &DbErr) -> Option<&DbErr> {
    Some(err)
}

/// Runs `op`, retrying it exactly once if the first attempt failed with a transient
/// connection error. `storage` pulls the underlying `DbErr` out of `E`; errors that
/// carry none (domain rejections) are returned as-is, like every non-transient one.
///
/// ```ignore
/// db::retry_transient(db::as_storage, || Model::materialize_day(&db, date)).await
/// ```
pub async fn retry_transient<T, E, S, F, Fut>(storage: S, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    S: Fn(&E) -> Option<&DbErr>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match op().await {
        Err(err) if storage(&err).is_some_and(is_transient) => {
            tracing::warn!(error = %err, "Transient storage error; retrying once");
            op().await
        }
        other => other,
    }
}
