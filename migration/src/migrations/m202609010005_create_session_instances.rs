use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202609010005_create_session_instances"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("session_instances"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("timetable_session_id")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("session_date")).date().not_null())
                    .col(ColumnDef::new(Alias::new("scheduled_start")).time().not_null())
                    .col(ColumnDef::new(Alias::new("scheduled_end")).time().not_null())
                    .col(
                        ColumnDef::new(Alias::new("status"))
                            .enumeration(
                                Alias::new("session_status_type"),
                                vec![
                                    Alias::new("scheduled"),
                                    Alias::new("in_progress"),
                                    Alias::new("completed"),
                                ],
                            )
                            .not_null()
                            .default("scheduled"),
                    )
                    .col(ColumnDef::new(Alias::new("actual_start_time")).timestamp().null())
                    .col(ColumnDef::new(Alias::new("actual_end_time")).timestamp().null())
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_instances_timetable")
                            .from(Alias::new("session_instances"), Alias::new("timetable_session_id"))
                            .to(Alias::new("timetable_sessions"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // one occurrence per timetable slot per day; materialisation relies on it
        manager
            .create_index(
                Index::create()
                    .name("ux_session_instances_slot_date")
                    .table(Alias::new("session_instances"))
                    .col(Alias::new("timetable_session_id"))
                    .col(Alias::new("session_date"))
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("session_instances")).to_owned())
            .await
    }
}
