use crate::models::{
    class, class_lecturer,
    session_instance::{self, SessionStatus},
    student_enrollment,
    timetable_session::{self, Weekday},
    user::{self, UserRole},
};
use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use migration::Migrator;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

/// Fresh in-memory SQLite database with every migration applied.
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Migrated SQLite database in a file at `path`. Unlike the in-memory one it is
/// served by a real connection pool, so concurrent transactions actually overlap.
pub async fn setup_file_test_db(path: &std::path::Path) -> DatabaseConnection {
    let db = Database::connect(format!("sqlite://{}?mode=rwc", path.display()))
        .await
        .expect("Failed to connect to file db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// A class with one lecturer, one enrolled student and one session instance.
pub struct SessionFixture {
    pub lecturer: user::Model,
    pub student: user::Model,
    pub class: class::Model,
    pub slot: timetable_session::Model,
    pub instance: session_instance::Model,
}

/// Seeds a `SessionFixture` whose instance runs `start`–`end` on `date` with `status`.
///
/// `tag` keeps usernames and class codes unique when a test seeds more than one.
pub async fn seed_session(
    db: &DatabaseConnection,
    tag: &str,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    status: SessionStatus,
) -> SessionFixture {
    let lecturer = user::Model::create(
        db,
        &format!("lect_{tag}"),
        &format!("lect_{tag}@test.com"),
        "password",
        UserRole::Lecturer,
    )
    .await
    .expect("create lecturer");
    let student = user::Model::create(
        db,
        &format!("stud_{tag}"),
        &format!("stud_{tag}@test.com"),
        "password",
        UserRole::Student,
    )
    .await
    .expect("create student");

    let class = class::Model::create(db, &format!("CLS_{tag}"), "Fixture Class")
        .await
        .expect("create class");
    class_lecturer::Model::assign(db, class.id, lecturer.id)
        .await
        .expect("assign lecturer");
    student_enrollment::Model::enroll(db, student.id, class.id)
        .await
        .expect("enroll student");

    let slot = timetable_session::Model::create(
        db,
        class.id,
        "Lecture",
        Weekday::from(date.weekday()),
        start,
        end,
    )
    .await
    .expect("create timetable slot");

    let instance = session_instance::ActiveModel {
        timetable_session_id: Set(slot.id),
        session_date: Set(date),
        scheduled_start: Set(start),
        scheduled_end: Set(end),
        status: Set(status),
        actual_start_time: Set(None),
        actual_end_time: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("create session instance");

    SessionFixture {
        lecturer,
        student,
        class,
        slot,
        instance,
    }
}
