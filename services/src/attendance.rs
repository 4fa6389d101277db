//! The attendance ledger outside of check-in: a student's own status and history,
//! the per-session roll a lecturer sees or downloads as CSV, and manual status
//! changes by staff.

use crate::session_lifecycle::{Actor, LifecycleError, authorize};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use db::models::{
    attendance_record::{self, AttendanceStatus},
    class, session_instance, student_enrollment, timetable_session, user,
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;

/// Whether the student has a record for the session, and what it says.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AttendanceStatusView {
    pub session_instance_id: i64,
    pub marked: bool,
    pub status: Option<AttendanceStatus>,
    pub check_in_time: Option<DateTime<Utc>>,
}

pub async fn attendance_status(
    db: &DatabaseConnection,
    student_id: i64,
    session_instance_id: i64,
) -> Result<AttendanceStatusView, DbErr> {
    let record = attendance_record::Model::find_for(db, student_id, session_instance_id).await?;

    Ok(AttendanceStatusView {
        session_instance_id,
        marked: record.is_some(),
        status: record.as_ref().map(|r| r.status),
        check_in_time: record.and_then(|r| r.check_in_time),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub record_id: i64,
    pub session_instance_id: i64,
    pub session_date: Option<NaiveDate>,
    pub scheduled_start: Option<NaiveTime>,
    pub session_title: Option<String>,
    pub class_code: Option<String>,
    pub class_name: Option<String>,
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub confidence: Option<f64>,
}

/// The student's records joined with session and class, newest session first.
pub async fn student_history(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<HistoryEntry>, DbErr> {
    let rows = attendance_record::Model::list_for_student(db, student_id).await?;

    let slot_ids: Vec<i64> = rows
        .iter()
        .filter_map(|(_, inst)| inst.as_ref().map(|i| i.timetable_session_id))
        .collect();
    let slots: HashMap<i64, timetable_session::Model> = timetable_session::Entity::find()
        .filter(timetable_session::Column::Id.is_in(slot_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let class_ids: Vec<i64> = slots.values().map(|s| s.class_id).collect();
    let classes: HashMap<i64, class::Model> = class::Entity::find()
        .filter(class::Column::Id.is_in(class_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    Ok(rows
        .into_iter()
        .map(|(record, instance)| {
            let slot = instance
                .as_ref()
                .and_then(|i| slots.get(&i.timetable_session_id));
            let class = slot.and_then(|s| classes.get(&s.class_id));
            HistoryEntry {
                record_id: record.id,
                session_instance_id: record.session_instance_id,
                session_date: instance.as_ref().map(|i| i.session_date),
                scheduled_start: instance.as_ref().map(|i| i.scheduled_start),
                session_title: slot.map(|s| s.session_title.clone()),
                class_code: class.map(|c| c.class_code.clone()),
                class_name: class.map(|c| c.class_name.clone()),
                status: record.status,
                check_in_time: record.check_in_time,
                confidence: record.confidence,
            }
        })
        .collect())
}

/// Counts over a student's whole history.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AttendanceSummary {
    pub total: usize,
    pub present: usize,
    pub late: usize,
    pub absent: usize,
    /// Share of `present` records, in whole percent. Zero without records.
    pub percentage: f64,
}

pub fn summarize(entries: &[HistoryEntry]) -> AttendanceSummary {
    let mut summary = AttendanceSummary {
        total: entries.len(),
        ..Default::default()
    };
    for entry in entries {
        match entry.status {
            AttendanceStatus::Present => summary.present += 1,
            AttendanceStatus::Late => summary.late += 1,
            AttendanceStatus::Absent => summary.absent += 1,
        }
    }
    if summary.total > 0 {
        summary.percentage = (summary.present as f64 / summary.total as f64 * 100.0).round();
    }
    summary
}

#[derive(Debug, Clone, Serialize)]
pub struct MyAttendance {
    pub summary: AttendanceSummary,
    pub records: Vec<HistoryEntry>,
}

/// History plus summary. The summary always covers every record; `status` only
/// narrows the returned list.
pub async fn my_attendance(
    db: &DatabaseConnection,
    student_id: i64,
    status: Option<AttendanceStatus>,
) -> Result<MyAttendance, DbErr> {
    let mut records = student_history(db, student_id).await?;
    let summary = summarize(&records);
    if let Some(status) = status {
        records.retain(|r| r.status == status);
    }
    Ok(MyAttendance { summary, records })
}

/// One line of a session roll.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecordRow {
    pub record_id: i64,
    pub student_id: i64,
    pub username: String,
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub confidence: Option<f64>,
    pub notes: Option<String>,
}

/// Every record of a session with the student's username.
pub async fn session_records(
    db: &DatabaseConnection,
    session_instance_id: i64,
) -> Result<Vec<SessionRecordRow>, DbErr> {
    let records = attendance_record::Model::list_for_session(db, session_instance_id).await?;

    let student_ids: Vec<i64> = records.iter().map(|r| r.student_id).collect();
    let usernames: HashMap<i64, String> = user::Entity::find()
        .filter(user::Column::Id.is_in(student_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    Ok(records
        .into_iter()
        .map(|r| SessionRecordRow {
            record_id: r.id,
            student_id: r.student_id,
            username: usernames.get(&r.student_id).cloned().unwrap_or_default(),
            status: r.status,
            check_in_time: r.check_in_time,
            confidence: r.confidence,
            notes: r.notes,
        })
        .collect())
}

async fn override_once(
    db: &DatabaseConnection,
    actor: Actor,
    session_instance_id: i64,
    student_id: i64,
    status: AttendanceStatus,
    notes: Option<String>,
    at: DateTime<Utc>,
) -> Result<attendance_record::Model, LifecycleError> {
    let txn = db.begin().await?;
    session_instance::Model::claim(&txn, session_instance_id).await?;
    let ctx = authorize(&txn, actor, session_instance_id).await?;

    // a student who has since dropped can still have an existing record corrected
    let enrolled = student_enrollment::Model::is_enrolled(&txn, student_id, ctx.class_id()).await?;
    if !enrolled
        && attendance_record::Model::find_for(&txn, student_id, session_instance_id)
            .await?
            .is_none()
    {
        return Err(LifecycleError::NotEnrolled);
    }

    let record = attendance_record::Model::set_status(
        &txn,
        student_id,
        session_instance_id,
        status,
        notes,
        Some(actor.user_id),
        at,
    )
    .await?;
    txn.commit().await?;
    Ok(record)
}

/// Sets a student's status for a session by hand, e.g. to excuse a late arrival.
///
/// Only staff who may manage the session can do this. The record is created when
/// the student has none yet.
pub async fn override_status(
    db: &DatabaseConnection,
    actor: Actor,
    session_instance_id: i64,
    student_id: i64,
    status: AttendanceStatus,
    notes: Option<String>,
    at: DateTime<Utc>,
) -> Result<attendance_record::Model, LifecycleError> {
    let record = db::retry_transient(LifecycleError::storage, || {
        override_once(db, actor, session_instance_id, student_id, status, notes.clone(), at)
    })
    .await?;
    tracing::info!(
        session_instance_id,
        student_id,
        by = actor.user_id,
        %status,
        "Attendance status set manually"
    );
    Ok(record)
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Renders a session roll as CSV, header included.
pub fn records_csv(session_instance_id: i64, rows: &[SessionRecordRow]) -> String {
    let mut csv = String::from(
        "session_instance_id,student_id,username,status,check_in_time,confidence,notes\n",
    );

    for r in rows {
        let check_in = r
            .check_in_time
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();
        let confidence = r.confidence.map(|c| format!("{c:.2}")).unwrap_or_default();

        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            session_instance_id,
            r.student_id,
            csv_escape(&r.username),
            r.status,
            check_in,
            confidence,
            csv_escape(r.notes.as_deref().unwrap_or("")),
        ));
    }

    csv
}
