use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One ledger entry: a student's attendance for one session instance.
///
/// `(student_id, session_instance_id)` is unique at the storage level.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub session_instance_id: i64,
    pub status: AttendanceStatus,
    /// `None` for absentees filled in when the session ends.
    pub check_in_time: Option<DateTime<Utc>>,
    /// Face-match confidence in `0.0..=1.0`, if the check-in was verified.
    #[sea_orm(column_type = "Double", nullable)]
    pub confidence: Option<f64>,
    pub notes: Option<String>,
    /// Staff member who last set the status by hand; `None` for check-ins and
    /// absentees written by the system.
    pub marked_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,

    #[sea_orm(string_value = "late")]
    Late,

    #[sea_orm(string_value = "absent")]
    Absent,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::session_instance::Entity",
        from = "Column::SessionInstanceId",
        to = "super::session_instance::Column::Id"
    )]
    SessionInstance,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::session_instance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionInstance.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Inserts a `present` record. Fails with a unique-constraint error if the
    /// student already has a record for the instance.
    pub async fn insert_present<C: ConnectionTrait>(
        db: &C,
        student_id: i64,
        session_instance_id: i64,
        check_in_time: DateTime<Utc>,
        confidence: Option<f64>,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            student_id: Set(student_id),
            session_instance_id: Set(session_instance_id),
            status: Set(AttendanceStatus::Present),
            check_in_time: Set(Some(check_in_time)),
            confidence: Set(confidence),
            notes: Set(None),
            marked_by: Set(None),
            created_at: Set(check_in_time),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find_for<C: ConnectionTrait>(
        db: &C,
        student_id: i64,
        session_instance_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::SessionInstanceId.eq(session_instance_id))
            .one(db)
            .await
    }

    /// Sets a student's status by hand, creating the record if there is none.
    ///
    /// An existing record keeps its check-in time and confidence; `notes` replaces the
    /// old notes only when given. A new record gets `at` as its check-in time unless it
    /// is `absent`.
    pub async fn set_status<C: ConnectionTrait>(
        db: &C,
        student_id: i64,
        session_instance_id: i64,
        status: AttendanceStatus,
        notes: Option<String>,
        marked_by: Option<i64>,
        at: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        if let Some(existing) = Self::find_for(db, student_id, session_instance_id).await? {
            let mut active: ActiveModel = existing.into();
            active.status = Set(status);
            active.marked_by = Set(marked_by);
            if notes.is_some() {
                active.notes = Set(notes);
            }
            return active.update(db).await;
        }

        ActiveModel {
            student_id: Set(student_id),
            session_instance_id: Set(session_instance_id),
            status: Set(status),
            check_in_time: Set((status != AttendanceStatus::Absent).then_some(at)),
            confidence: Set(None),
            notes: Set(notes),
            marked_by: Set(marked_by),
            created_at: Set(at),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Records of one instance in the order they were written: check-ins first,
    /// then the absentees filled in when the session ended.
    pub async fn list_for_session<C: ConnectionTrait>(
        db: &C,
        session_instance_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::SessionInstanceId.eq(session_instance_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// A student's history joined with the session instances, newest first.
    pub async fn list_for_student<C: ConnectionTrait>(
        db: &C,
        student_id: i64,
    ) -> Result<Vec<(Self, Option<super::session_instance::Model>)>, DbErr> {
        use super::session_instance::Column as InstanceCol;

        Entity::find()
            .find_also_related(super::session_instance::Entity)
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(InstanceCol::SessionDate)
            .order_by_desc(InstanceCol::ScheduledStart)
            .all(db)
            .await
    }

    /// Inserts an `absent` record for every student in `student_ids` that has no
    /// record for the instance yet. Returns the number of absentees written.
    pub async fn mark_absentees<C: ConnectionTrait>(
        db: &C,
        session_instance_id: i64,
        student_ids: &[i64],
    ) -> Result<u64, DbErr> {
        let marked: Vec<i64> = Entity::find()
            .filter(Column::SessionInstanceId.eq(session_instance_id))
            .all(db)
            .await?
            .into_iter()
            .map(|r| r.student_id)
            .collect();

        let now = Utc::now();
        let missing: Vec<ActiveModel> = student_ids
            .iter()
            .filter(|id| !marked.contains(id))
            .map(|&student_id| ActiveModel {
                student_id: Set(student_id),
                session_instance_id: Set(session_instance_id),
                status: Set(AttendanceStatus::Absent),
                check_in_time: Set(None),
                confidence: Set(None),
                notes: Set(None),
                marked_by: Set(None),
                created_at: Set(now),
                ..Default::default()
            })
            .collect();

        let count = missing.len() as u64;
        if count > 0 {
            Entity::insert_many(missing).exec(db).await?;
        }
        Ok(count)
    }
}
