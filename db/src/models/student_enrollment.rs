use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{QuerySelect, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A student's enrollment in a class. Only `enrolled` rows make a student
/// eligible to check in.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "student_enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub class_id: i64,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "enrollment_status_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EnrollmentStatus {
    #[sea_orm(string_value = "enrolled")]
    Enrolled,

    #[sea_orm(string_value = "dropped")]
    Dropped,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,

    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id"
    )]
    Class,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Enrolls a student, re-activating a previously dropped enrollment.
    pub async fn enroll(
        db: &DatabaseConnection,
        student_id: i64,
        class_id: i64,
    ) -> Result<Self, DbErr> {
        Self::set_status(db, student_id, class_id, EnrollmentStatus::Enrolled).await
    }

    pub async fn drop_student(
        db: &DatabaseConnection,
        student_id: i64,
        class_id: i64,
    ) -> Result<Self, DbErr> {
        Self::set_status(db, student_id, class_id, EnrollmentStatus::Dropped).await
    }

    async fn set_status(
        db: &DatabaseConnection,
        student_id: i64,
        class_id: i64,
        status: EnrollmentStatus,
    ) -> Result<Self, DbErr> {
        match Entity::find_by_id((student_id, class_id)).one(db).await? {
            Some(existing) => {
                let mut active: ActiveModel = existing.into();
                active.status = Set(status);
                active.update(db).await
            }
            None => {
                ActiveModel {
                    student_id: Set(student_id),
                    class_id: Set(class_id),
                    status: Set(status),
                    enrolled_at: Set(Utc::now()),
                }
                .insert(db)
                .await
            }
        }
    }

    pub async fn is_enrolled<C: ConnectionTrait>(
        db: &C,
        student_id: i64,
        class_id: i64,
    ) -> Result<bool, DbErr> {
        Ok(Entity::find_by_id((student_id, class_id))
            .filter(Column::Status.eq(EnrollmentStatus::Enrolled))
            .one(db)
            .await?
            .is_some())
    }

    /// Class IDs the student is currently enrolled in.
    pub async fn enrolled_class_ids<C: ConnectionTrait>(
        db: &C,
        student_id: i64,
    ) -> Result<Vec<i64>, DbErr> {
        Entity::find()
            .select_only()
            .column(Column::ClassId)
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Status.eq(EnrollmentStatus::Enrolled))
            .into_tuple()
            .all(db)
            .await
    }

    /// Student IDs currently enrolled in the class.
    pub async fn enrolled_student_ids<C: ConnectionTrait>(
        db: &C,
        class_id: i64,
    ) -> Result<Vec<i64>, DbErr> {
        Entity::find()
            .select_only()
            .column(Column::StudentId)
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::Status.eq(EnrollmentStatus::Enrolled))
            .into_tuple()
            .all(db)
            .await
    }
}
