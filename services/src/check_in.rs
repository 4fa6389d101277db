//! Student check-in.
//!
//! A check-in is accepted when, in this order:
//! 1. the instance exists, is today, and the student is enrolled in its class;
//! 2. the instance is `in_progress`, or still `scheduled` but started by a lecturer;
//! 3. the scheduled end plus the grace period has not passed;
//! 4. the student has no record for the instance yet;
//! 5. face verification matched with at least the configured confidence.
//!
//! The first failing rule decides the error. A successful check-in writes one
//! `present` record and, for a `scheduled` instance, moves it to `in_progress`,
//! both inside one transaction.

use crate::verification::{VerificationProvider, VerificationResult, verify_with_timeout};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use db::models::{
    attendance_record, class,
    session_instance::{self, SessionContext, SessionStatus},
    session_log, student_enrollment,
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    TransactionTrait,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use util::config;

#[derive(Debug, thiserror::Error)]
pub enum CheckInError {
    #[error("Session not found or not open to this student today")]
    InvalidSession,

    #[error("Session has not been started")]
    NotStarted,

    #[error("Check-in window has closed")]
    WindowClosed,

    #[error("Attendance already recorded")]
    AlreadyMarked,

    #[error("Face verification failed")]
    VerificationFailed,

    #[error("Storage error: {0}")]
    Storage(#[from] DbErr),
}

impl CheckInError {
    /// The storage failure behind this error, if any.
    pub fn storage(&self) -> Option<&DbErr> {
        match self {
            CheckInError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

/// Tunables for accepting a check-in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckInPolicy {
    /// How long after the scheduled end check-in stays open.
    pub grace: Duration,
    /// Minimum verification confidence.
    pub threshold: f64,
    /// Upper bound on a single verification call.
    pub verification_timeout: std::time::Duration,
}

impl Default for CheckInPolicy {
    fn default() -> Self {
        Self {
            grace: Duration::minutes(15),
            threshold: 0.6,
            verification_timeout: std::time::Duration::from_millis(5000),
        }
    }
}

impl CheckInPolicy {
    pub fn from_config() -> Self {
        Self {
            grace: Duration::minutes(config::grace_minutes()),
            threshold: config::verification_threshold(),
            verification_timeout: std::time::Duration::from_millis(
                config::verification_timeout_ms(),
            ),
        }
    }

    pub fn accepts(&self, verification: &VerificationResult) -> bool {
        verification.matched && verification.confidence >= self.threshold
    }
}

/// Rules 1 to 4. Read-only, so it can run on a plain connection or inside a transaction.
async fn check_preconditions<C: ConnectionTrait>(
    db: &C,
    student_id: i64,
    session_instance_id: i64,
    now: NaiveDateTime,
    policy: &CheckInPolicy,
) -> Result<SessionContext, CheckInError> {
    let ctx = session_instance::Model::find_context(db, session_instance_id)
        .await?
        .ok_or(CheckInError::InvalidSession)?;

    if ctx.instance.session_date != now.date()
        || !student_enrollment::Model::is_enrolled(db, student_id, ctx.class_id()).await?
    {
        return Err(CheckInError::InvalidSession);
    }

    let started = match ctx.instance.status {
        SessionStatus::InProgress => true,
        SessionStatus::Scheduled => {
            session_log::Model::has_start_marker(db, session_instance_id).await?
        }
        SessionStatus::Completed => false,
    };
    if !started {
        return Err(CheckInError::NotStarted);
    }

    if now > ctx.instance.check_in_deadline(policy.grace) {
        return Err(CheckInError::WindowClosed);
    }

    if attendance_record::Model::find_for(db, student_id, session_instance_id)
        .await?
        .is_some()
    {
        return Err(CheckInError::AlreadyMarked);
    }

    Ok(ctx)
}

/// Checks rules 1 to 4 without writing anything.
///
/// Lets callers skip the verification round-trip for attempts that can't succeed.
pub async fn precheck(
    db: &DatabaseConnection,
    student_id: i64,
    session_instance_id: i64,
    now: DateTime<Local>,
    policy: &CheckInPolicy,
) -> Result<SessionContext, CheckInError> {
    db::retry_transient(CheckInError::storage, || {
        check_preconditions(db, student_id, session_instance_id, now.naive_local(), policy)
    })
    .await
}

async fn check_in_once(
    db: &DatabaseConnection,
    student_id: i64,
    session_instance_id: i64,
    verification: VerificationResult,
    now: DateTime<Local>,
    policy: &CheckInPolicy,
) -> Result<attendance_record::Model, CheckInError> {
    let txn = db.begin().await?;
    session_instance::Model::claim(&txn, session_instance_id).await?;

    let ctx =
        check_preconditions(&txn, student_id, session_instance_id, now.naive_local(), policy)
            .await?;

    if !policy.accepts(&verification) {
        return Err(CheckInError::VerificationFailed);
    }

    let at = now.with_timezone(&Utc);
    let record = attendance_record::Model::insert_present(
        &txn,
        student_id,
        session_instance_id,
        at,
        Some(verification.confidence),
    )
    .await
    .map_err(|e| {
        if db::is_unique_violation(&e) {
            CheckInError::AlreadyMarked
        } else {
            CheckInError::Storage(e)
        }
    })?;

    if ctx.instance.status == SessionStatus::Scheduled {
        session_instance::Model::transition(
            &txn,
            session_instance_id,
            SessionStatus::Scheduled,
            SessionStatus::InProgress,
            at,
        )
        .await?;
    }

    txn.commit().await?;
    Ok(record)
}

/// Records a check-in for `student_id` given an already obtained verification result.
pub async fn attempt_check_in(
    db: &DatabaseConnection,
    student_id: i64,
    session_instance_id: i64,
    verification: VerificationResult,
    now: DateTime<Local>,
    policy: &CheckInPolicy,
) -> Result<attendance_record::Model, CheckInError> {
    let result = db::retry_transient(CheckInError::storage, || {
        check_in_once(db, student_id, session_instance_id, verification, now, policy)
    })
    .await;

    match &result {
        Ok(record) => tracing::info!(
            student_id,
            session_instance_id,
            record_id = record.id,
            confidence = verification.confidence,
            "Check-in recorded"
        ),
        Err(CheckInError::Storage(e)) => tracing::error!(
            student_id,
            session_instance_id,
            error = %e,
            "Check-in failed on storage"
        ),
        Err(e) => tracing::info!(
            student_id,
            session_instance_id,
            reason = %e,
            "Check-in rejected"
        ),
    }

    result
}

/// Full check-in flow: rules 1 to 4, then the verification call, then the write.
pub async fn check_in_with_provider(
    db: &DatabaseConnection,
    provider: &dyn VerificationProvider,
    student_id: i64,
    session_instance_id: i64,
    sample: &[u8],
    now: DateTime<Local>,
    policy: &CheckInPolicy,
) -> Result<attendance_record::Model, CheckInError> {
    if let Err(e) = precheck(db, student_id, session_instance_id, now, policy).await {
        tracing::info!(student_id, session_instance_id, reason = %e, "Check-in rejected");
        return Err(e);
    }

    let verification =
        verify_with_timeout(provider, student_id, sample, policy.verification_timeout).await;

    attempt_check_in(db, student_id, session_instance_id, verification, now, policy).await
}

/// A session instance as offered to a student on the check-in screen.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableSession {
    pub session_instance_id: i64,
    pub class_id: i64,
    pub class_code: String,
    pub class_name: String,
    pub session_title: String,
    pub session_date: NaiveDate,
    pub scheduled_start: NaiveTime,
    pub scheduled_end: NaiveTime,
    pub status: SessionStatus,
    pub checked_in: bool,
}

/// Instances on `date` for every class the student is enrolled in, earliest first.
pub async fn list_available_sessions(
    db: &DatabaseConnection,
    student_id: i64,
    date: NaiveDate,
) -> Result<Vec<AvailableSession>, DbErr> {
    let class_ids = student_enrollment::Model::enrolled_class_ids(db, student_id).await?;
    let contexts = session_instance::Model::list_for_classes_on(db, &class_ids, date).await?;
    if contexts.is_empty() {
        return Ok(Vec::new());
    }

    let classes: HashMap<i64, class::Model> = class::Entity::find()
        .filter(class::Column::Id.is_in(class_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let instance_ids: Vec<i64> = contexts.iter().map(|c| c.instance.id).collect();
    let checked_in: HashSet<i64> = attendance_record::Entity::find()
        .filter(attendance_record::Column::StudentId.eq(student_id))
        .filter(attendance_record::Column::SessionInstanceId.is_in(instance_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|r| r.session_instance_id)
        .collect();

    Ok(contexts
        .into_iter()
        .map(|ctx| {
            let (class_code, class_name) = classes
                .get(&ctx.class_id())
                .map(|c| (c.class_code.clone(), c.class_name.clone()))
                .unwrap_or_default();
            AvailableSession {
                session_instance_id: ctx.instance.id,
                class_id: ctx.class_id(),
                class_code,
                class_name,
                session_title: ctx.slot.session_title,
                session_date: ctx.instance.session_date,
                scheduled_start: ctx.instance.scheduled_start,
                scheduled_end: ctx.instance.scheduled_end,
                status: ctx.instance.status,
                checked_in: checked_in.contains(&ctx.instance.id),
            }
        })
        .collect())
}

/// Like [`list_available_sessions`], but materialises `date` first when it is
/// `today`, so slots added since the last materialisation still show up.
pub async fn available_sessions(
    db: &DatabaseConnection,
    student_id: i64,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<Vec<AvailableSession>, DbErr> {
    if date == today {
        let created = crate::session_lifecycle::materialize_day(db, date).await?;
        if created > 0 {
            tracing::debug!(%date, created, "Materialised sessions on demand");
        }
    }
    list_available_sessions(db, student_id, date).await
}
