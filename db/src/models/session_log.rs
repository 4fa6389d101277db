use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Audit trail of lecturer actions on a session instance.
///
/// A `session_started` entry also acts as the lecturer-start marker: check-in
/// treats a still-`scheduled` instance that has one as started.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "session_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub session_instance_id: i64,
    pub action: SessionAction,
    pub performed_by: i64,
    pub details: Option<Json>,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "session_action_type")]
#[strum(serialize_all = "snake_case")]
pub enum SessionAction {
    #[sea_orm(string_value = "session_started")]
    SessionStarted,

    #[sea_orm(string_value = "session_ended")]
    SessionEnded,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::session_instance::Entity",
        from = "Column::SessionInstanceId",
        to = "super::session_instance::Column::Id"
    )]
    SessionInstance,
}

impl Related<super::session_instance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionInstance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        session_instance_id: i64,
        action: SessionAction,
        performed_by: i64,
        details: Option<Json>,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            session_instance_id: Set(session_instance_id),
            action: Set(action),
            performed_by: Set(performed_by),
            details: Set(details),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    /// Whether a lecturer has logged a start for this instance.
    pub async fn has_start_marker<C: ConnectionTrait>(
        db: &C,
        session_instance_id: i64,
    ) -> Result<bool, DbErr> {
        Ok(Entity::find()
            .filter(Column::SessionInstanceId.eq(session_instance_id))
            .filter(Column::Action.eq(SessionAction::SessionStarted))
            .one(db)
            .await?
            .is_some())
    }
}
