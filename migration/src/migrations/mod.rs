pub mod m202609010001_create_users;
pub mod m202609010002_create_classes;
pub mod m202609010003_create_student_enrollments;
pub mod m202609010004_create_timetable_sessions;
pub mod m202609010005_create_session_instances;
pub mod m202609010006_create_attendance_records;
pub mod m202609010007_create_session_logs;
