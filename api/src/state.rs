//! Application state shared across Axum route handlers.
//!
//! Holds the database connection, the face verification provider and the
//! check-in policy. Cloning is cheap: the connection is a pool handle and the
//! provider sits behind an `Arc`.

use sea_orm::DatabaseConnection;
use services::check_in::CheckInPolicy;
use services::verification::VerificationProvider;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    verifier: Arc<dyn VerificationProvider>,
    policy: CheckInPolicy,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        verifier: Arc<dyn VerificationProvider>,
        policy: CheckInPolicy,
    ) -> Self {
        Self {
            db,
            verifier,
            policy,
        }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn verifier(&self) -> &dyn VerificationProvider {
        self.verifier.as_ref()
    }

    pub fn policy(&self) -> &CheckInPolicy {
        &self.policy
    }
}
