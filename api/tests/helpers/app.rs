use api::{auth::generate_jwt, routes::routes, state::AppState};
use axum::{Router, body::Body, response::Response};
use db::models::user::UserRole;
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use services::check_in::CheckInPolicy;
use services::verification::{FixedVerificationProvider, VerificationResult};
use std::sync::Arc;
use util::config::AppConfig;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
}

/// App backed by a fresh in-memory database whose verifier accepts everyone.
pub async fn make_test_app() -> TestApp {
    make_test_app_with(VerificationResult {
        matched: true,
        confidence: 0.92,
    })
    .await
}

pub async fn make_test_app_with(verification: VerificationResult) -> TestApp {
    AppConfig::set_jwt_secret(TEST_JWT_SECRET);

    let db = setup_test_db().await;
    let state = AppState::new(
        db.clone(),
        Arc::new(FixedVerificationProvider(verification)),
        CheckInPolicy::default(),
    );

    TestApp {
        router: axum::Router::new().nest("/api", routes(state)),
        db,
    }
}

pub fn bearer(user_id: i64, role: UserRole) -> String {
    let (token, _) = generate_jwt(user_id, role).unwrap();
    format!("Bearer {token}")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
