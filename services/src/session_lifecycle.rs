//! Lecturer-driven session lifecycle: `scheduled → in_progress → completed`.
//!
//! Starting writes a `session_started` log entry, which is also what lets
//! students check into a session that is still `scheduled`. Ending fills in an
//! `absent` record for every enrolled student who never checked in.

use chrono::{DateTime, NaiveDate, Utc};
use db::models::{
    attendance_record, class_lecturer,
    session_instance::{self, SessionContext, SessionStatus},
    session_log::{self, SessionAction},
    student_enrollment,
    user::UserRole,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Session not found")]
    NotFound,

    #[error("You are not assigned to this class")]
    Forbidden,

    #[error("Student is not enrolled in this class")]
    NotEnrolled,

    #[error("Cannot {action} a session that is {current}")]
    InvalidTransition {
        action: &'static str,
        current: SessionStatus,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] DbErr),
}

impl LifecycleError {
    /// The storage failure behind this error, if any.
    pub fn storage(&self) -> Option<&DbErr> {
        match self {
            LifecycleError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

/// Who is acting on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: UserRole,
}

/// Loads the session and checks that `actor` may manage it.
///
/// Admins manage every session; lecturers only those of classes they are assigned to.
pub async fn authorize<C: ConnectionTrait>(
    db: &C,
    actor: Actor,
    session_instance_id: i64,
) -> Result<SessionContext, LifecycleError> {
    let ctx = session_instance::Model::find_context(db, session_instance_id)
        .await?
        .ok_or(LifecycleError::NotFound)?;

    let allowed = match actor.role {
        UserRole::Admin => true,
        UserRole::Lecturer => {
            class_lecturer::Model::is_assigned(db, ctx.class_id(), actor.user_id).await?
        }
        UserRole::Student => false,
    };

    if allowed {
        Ok(ctx)
    } else {
        Err(LifecycleError::Forbidden)
    }
}

async fn start_once(
    db: &DatabaseConnection,
    actor: Actor,
    session_instance_id: i64,
    at: DateTime<Utc>,
) -> Result<session_instance::Model, LifecycleError> {
    let txn = db.begin().await?;
    session_instance::Model::claim(&txn, session_instance_id).await?;
    let ctx = authorize(&txn, actor, session_instance_id).await?;

    let moved = session_instance::Model::transition(
        &txn,
        session_instance_id,
        SessionStatus::Scheduled,
        SessionStatus::InProgress,
        at,
    )
    .await?;
    if !moved {
        return Err(LifecycleError::InvalidTransition {
            action: "start",
            current: ctx.instance.status,
        });
    }

    session_log::Model::create(
        &txn,
        session_instance_id,
        SessionAction::SessionStarted,
        actor.user_id,
        Some(json!({ "role": actor.role.to_string() })),
    )
    .await?;

    let updated = session_instance::Model::find_context(&txn, session_instance_id)
        .await?
        .ok_or(LifecycleError::NotFound)?;
    txn.commit().await?;
    Ok(updated.instance)
}

/// Starts a `scheduled` session.
pub async fn start_session(
    db: &DatabaseConnection,
    actor: Actor,
    session_instance_id: i64,
    at: DateTime<Utc>,
) -> Result<session_instance::Model, LifecycleError> {
    let instance = db::retry_transient(LifecycleError::storage, || {
        start_once(db, actor, session_instance_id, at)
    })
    .await?;
    tracing::info!(
        session_instance_id,
        by = actor.user_id,
        "Session started"
    );
    Ok(instance)
}

/// Result of ending a session.
#[derive(Debug, Clone, Serialize)]
pub struct EndedSession {
    pub instance: session_instance::Model,
    /// Absent records written for students who never checked in.
    pub absentees: u64,
}

async fn end_once(
    db: &DatabaseConnection,
    actor: Actor,
    session_instance_id: i64,
    at: DateTime<Utc>,
) -> Result<EndedSession, LifecycleError> {
    let txn = db.begin().await?;
    session_instance::Model::claim(&txn, session_instance_id).await?;
    let ctx = authorize(&txn, actor, session_instance_id).await?;

    let moved = session_instance::Model::transition(
        &txn,
        session_instance_id,
        SessionStatus::InProgress,
        SessionStatus::Completed,
        at,
    )
    .await?;
    if !moved {
        return Err(LifecycleError::InvalidTransition {
            action: "end",
            current: ctx.instance.status,
        });
    }

    let enrolled = student_enrollment::Model::enrolled_student_ids(&txn, ctx.class_id()).await?;
    let absentees =
        attendance_record::Model::mark_absentees(&txn, session_instance_id, &enrolled).await?;

    session_log::Model::create(
        &txn,
        session_instance_id,
        SessionAction::SessionEnded,
        actor.user_id,
        Some(json!({ "role": actor.role.to_string(), "absentees": absentees })),
    )
    .await?;

    let updated = session_instance::Model::find_context(&txn, session_instance_id)
        .await?
        .ok_or(LifecycleError::NotFound)?;
    txn.commit().await?;

    Ok(EndedSession {
        instance: updated.instance,
        absentees,
    })
}

/// Ends an `in_progress` session and marks everyone who didn't check in as absent.
pub async fn end_session(
    db: &DatabaseConnection,
    actor: Actor,
    session_instance_id: i64,
    at: DateTime<Utc>,
) -> Result<EndedSession, LifecycleError> {
    let ended = db::retry_transient(LifecycleError::storage, || {
        end_once(db, actor, session_instance_id, at)
    })
    .await?;
    tracing::info!(
        session_instance_id,
        by = actor.user_id,
        absentees = ended.absentees,
        "Session ended"
    );
    Ok(ended)
}

/// Creates the `scheduled` instances for `date`. Safe to call repeatedly.
pub async fn materialize_day(db: &DatabaseConnection, date: NaiveDate) -> Result<u64, DbErr> {
    db::retry_transient(db::as_storage, || {
        session_instance::Model::materialize_day(db, date)
    })
    .await
}
