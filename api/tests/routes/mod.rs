mod admin_test;
mod auth_test;
mod health_test;
mod me_test;
mod sessions_test;
