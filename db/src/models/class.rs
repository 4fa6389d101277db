use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A taught class (course offering) in the `classes` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_code: String,
    pub class_name: String,
    pub status: ClassStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "class_status_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ClassStatus {
    #[sea_orm(string_value = "active")]
    Active,

    #[sea_orm(string_value = "inactive")]
    Inactive,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::timetable_session::Entity")]
    TimetableSessions,

    #[sea_orm(has_many = "super::student_enrollment::Entity")]
    Enrollments,

    #[sea_orm(has_many = "super::class_lecturer::Entity")]
    Lecturers,
}

impl Related<super::timetable_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimetableSessions.def()
    }
}

impl Related<super::student_enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::class_lecturer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lecturers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        class_code: &str,
        class_name: &str,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();

        ActiveModel {
            class_code: Set(class_code.to_owned()),
            class_name: Set(class_name.to_owned()),
            status: Set(ClassStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn set_status(
        db: &DatabaseConnection,
        class_id: i64,
        status: ClassStatus,
    ) -> Result<Self, DbErr> {
        let model = Entity::find_by_id(class_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Class {class_id} not found")))?;

        let mut active: ActiveModel = model.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        active.update(db).await
    }
}
