use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::class::{self, ClassStatus};
use super::timetable_session::{self, TimetableStatus, Weekday};

/// One calendar occurrence of a timetabled class.
///
/// `scheduled_start` / `scheduled_end` are copied from the timetable slot when
/// the instance is materialised, so later timetable edits don't move sessions
/// that already exist.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "session_instances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub timetable_session_id: i64,
    pub session_date: NaiveDate,
    pub scheduled_start: NaiveTime,
    pub scheduled_end: NaiveTime,
    pub status: SessionStatus,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "session_status_type")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SessionStatus {
    #[sea_orm(string_value = "scheduled")]
    Scheduled,

    #[sea_orm(string_value = "in_progress")]
    InProgress,

    #[sea_orm(string_value = "completed")]
    Completed,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::timetable_session::Entity",
        from = "Column::TimetableSessionId",
        to = "super::timetable_session::Column::Id"
    )]
    TimetableSession,

    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,

    #[sea_orm(has_many = "super::session_log::Entity")]
    Logs,
}

impl Related<super::timetable_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimetableSession.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl Related<super::session_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Logs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A session instance together with the timetable slot it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionContext {
    pub instance: Model,
    pub slot: timetable_session::Model,
}

impl SessionContext {
    pub fn class_id(&self) -> i64 {
        self.slot.class_id
    }
}

impl Model {
    /// Last moment a check-in is accepted: scheduled end plus `grace`.
    pub fn check_in_deadline(&self, grace: Duration) -> NaiveDateTime {
        self.session_date.and_time(self.scheduled_end) + grace
    }

    /// Loads an instance with its timetable slot.
    pub async fn find_context<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<Option<SessionContext>, DbErr> {
        let found = Entity::find_by_id(id)
            .find_also_related(timetable_session::Entity)
            .one(db)
            .await?;

        Ok(match found {
            Some((instance, Some(slot))) => Some(SessionContext { instance, slot }),
            _ => None,
        })
    }

    /// Instances on `date` for any of `class_ids`, earliest first.
    pub async fn list_for_classes_on<C: ConnectionTrait>(
        db: &C,
        class_ids: &[i64],
        date: NaiveDate,
    ) -> Result<Vec<SessionContext>, DbErr> {
        if class_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Entity::find()
            .find_also_related(timetable_session::Entity)
            .filter(Column::SessionDate.eq(date))
            .filter(timetable_session::Column::ClassId.is_in(class_ids.to_vec()))
            .order_by_asc(Column::ScheduledStart)
            .order_by_asc(Column::Id)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(instance, slot)| slot.map(|slot| SessionContext { instance, slot }))
            .collect())
    }

    /// Moves the instance from `from` to `to` only if it is still in `from`.
    ///
    /// Stamps `actual_start_time` when entering `InProgress` and `actual_end_time`
    /// when entering `Completed`. Returns whether a row changed.
    pub async fn transition<C: ConnectionTrait>(
        db: &C,
        id: i64,
        from: SessionStatus,
        to: SessionStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let mut update = Entity::update_many()
            .col_expr(Column::Status, Expr::value(to))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.eq(from));

        update = match to {
            SessionStatus::InProgress => update.col_expr(Column::ActualStartTime, Expr::value(at)),
            SessionStatus::Completed => update.col_expr(Column::ActualEndTime, Expr::value(at)),
            SessionStatus::Scheduled => update,
        };

        Ok(update.exec(db).await?.rows_affected == 1)
    }

    /// No-op write on the instance row. Run first inside a transaction, it makes SQLite
    /// take the write lock before any read, so concurrent writers wait on the busy
    /// timeout instead of failing on a stale snapshot.
    pub async fn claim<C: ConnectionTrait>(db: &C, id: i64) -> Result<(), DbErr> {
        Entity::update_many()
            .col_expr(Column::Id, Expr::col(Column::Id).into())
            .filter(Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Creates today's (or `date`'s) scheduled instances for every active slot of an
    /// active class that falls on that weekday. Existing instances are left alone,
    /// so running it repeatedly is harmless. Returns how many rows were created.
    pub async fn materialize_day(db: &DatabaseConnection, date: NaiveDate) -> Result<u64, DbErr> {
        let weekday = Weekday::from(date.weekday());

        let slots = timetable_session::Entity::find()
            .inner_join(class::Entity)
            .filter(timetable_session::Column::DayOfWeek.eq(weekday))
            .filter(timetable_session::Column::Status.ne(TimetableStatus::Cancelled))
            .filter(class::Column::Status.eq(ClassStatus::Active))
            .all(db)
            .await?;

        let mut created = 0;
        for slot in slots {
            let exists = Entity::find()
                .filter(Column::TimetableSessionId.eq(slot.id))
                .filter(Column::SessionDate.eq(date))
                .one(db)
                .await?
                .is_some();
            if exists {
                continue;
            }

            let insert = ActiveModel {
                timetable_session_id: Set(slot.id),
                session_date: Set(date),
                scheduled_start: Set(slot.start_time),
                scheduled_end: Set(slot.end_time),
                status: Set(SessionStatus::Scheduled),
                actual_start_time: Set(None),
                actual_end_time: Set(None),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await;

            match insert {
                Ok(_) => created += 1,
                // another materialiser got there first
                Err(e) if crate::is_unique_violation(&e) => {}
                Err(e) => return Err(e),
            }
        }

        if created > 0 {
            tracing::info!(%date, created, "Materialised session instances");
        }
        Ok(created)
    }
}
