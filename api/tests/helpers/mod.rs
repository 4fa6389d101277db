pub mod app;

pub use app::{TestApp, bearer, body_json, make_test_app, make_test_app_with};
