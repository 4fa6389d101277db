use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202609010001_create_users::Migration),
            Box::new(migrations::m202609010002_create_classes::Migration),
            Box::new(migrations::m202609010003_create_student_enrollments::Migration),
            Box::new(migrations::m202609010004_create_timetable_sessions::Migration),
            Box::new(migrations::m202609010005_create_session_instances::Migration),
            Box::new(migrations::m202609010006_create_attendance_records::Migration),
            Box::new(migrations::m202609010007_create_session_logs::Migration),
        ]
    }
}
