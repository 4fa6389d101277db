use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202609010007_create_session_logs"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("session_logs"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("session_instance_id")).integer().not_null())
                    .col(
                        ColumnDef::new(Alias::new("action"))
                            .enumeration(
                                Alias::new("session_action_type"),
                                vec![Alias::new("session_started"), Alias::new("session_ended")],
                            )
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("performed_by")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("details")).json().null())
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_logs_instance")
                            .from(Alias::new("session_logs"), Alias::new("session_instance_id"))
                            .to(Alias::new("session_instances"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_logs_user")
                            .from(Alias::new("session_logs"), Alias::new("performed_by"))
                            .to(Alias::new("users"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("session_logs")).to_owned())
            .await
    }
}
