pub mod attendance_record;
pub mod class;
pub mod class_lecturer;
pub mod session_instance;
pub mod session_log;
pub mod student_enrollment;
pub mod timetable_session;
pub mod user;

pub use attendance_record::Entity as AttendanceRecord;
pub use class::Entity as Class;
pub use class_lecturer::Entity as ClassLecturer;
pub use session_instance::Entity as SessionInstance;
pub use session_log::Entity as SessionLog;
pub use student_enrollment::Entity as StudentEnrollment;
pub use timetable_session::Entity as TimetableSession;
pub use user::Entity as User;
