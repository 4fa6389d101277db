//! Face verification seam.
//!
//! The check-in flow only needs a yes/no answer with a confidence score, so the
//! matcher lives behind [`VerificationProvider`]. The production implementation
//! is [`HttpVerificationProvider`], which posts the captured image to a separate
//! verification service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use util::config;

/// Outcome of matching a captured sample against a student's enrolled face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub matched: bool,
    /// Match confidence in `0.0..=1.0`.
    pub confidence: f64,
}

impl VerificationResult {
    /// The result used whenever verification could not produce an answer.
    pub const REJECTED: Self = Self {
        matched: false,
        confidence: 0.0,
    };
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Face verification is not configured")]
    Disabled,

    #[error("Image sample is empty")]
    EmptySample,

    #[error("Verification timed out after {0:?}")]
    Timeout(Duration),

    #[error("Verification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Verification service error ({status}): {body}")]
    Service { status: u16, body: String },
}

#[async_trait]
pub trait VerificationProvider: Send + Sync {
    async fn verify(
        &self,
        student_id: i64,
        sample: &[u8],
    ) -> Result<VerificationResult, VerificationError>;
}

/// Calls an external verification service over HTTP.
///
/// `POST {endpoint}?student_id=<id>` with the raw image bytes as the body; the
/// service answers `{"matched": bool, "confidence": f64}`.
pub struct HttpVerificationProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpVerificationProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl VerificationProvider for HttpVerificationProvider {
    async fn verify(
        &self,
        student_id: i64,
        sample: &[u8],
    ) -> Result<VerificationResult, VerificationError> {
        if sample.is_empty() {
            return Err(VerificationError::EmptySample);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("student_id", student_id)])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(sample.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerificationError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let mut result: VerificationResult = response.json().await?;
        result.confidence = result.confidence.clamp(0.0, 1.0);
        Ok(result)
    }
}

/// Used when no verification service is configured. Every attempt is rejected.
pub struct DisabledVerificationProvider;

#[async_trait]
impl VerificationProvider for DisabledVerificationProvider {
    async fn verify(
        &self,
        _student_id: i64,
        _sample: &[u8],
    ) -> Result<VerificationResult, VerificationError> {
        Err(VerificationError::Disabled)
    }
}

/// Always answers with the same result. Handy for local development and tests.
pub struct FixedVerificationProvider(pub VerificationResult);

#[async_trait]
impl VerificationProvider for FixedVerificationProvider {
    async fn verify(
        &self,
        _student_id: i64,
        _sample: &[u8],
    ) -> Result<VerificationResult, VerificationError> {
        Ok(self.0)
    }
}

/// Builds the provider named by `VERIFICATION_URL`, or the disabled one when unset.
pub fn provider_from_config() -> Arc<dyn VerificationProvider> {
    let url = config::verification_url();
    if url.trim().is_empty() {
        tracing::warn!("VERIFICATION_URL is not set; every check-in will fail verification");
        Arc::new(DisabledVerificationProvider)
    } else {
        tracing::info!(endpoint = %url, "Using HTTP face verification");
        Arc::new(HttpVerificationProvider::new(url))
    }
}

/// Runs `provider` with an upper bound on how long it may take.
///
/// Fails closed: a timeout or provider error is logged and reported as
/// [`VerificationResult::REJECTED`].
pub async fn verify_with_timeout(
    provider: &dyn VerificationProvider,
    student_id: i64,
    sample: &[u8],
    timeout: Duration,
) -> VerificationResult {
    let outcome = match tokio::time::timeout(timeout, provider.verify(student_id, sample)).await {
        Ok(res) => res,
        Err(_) => Err(VerificationError::Timeout(timeout)),
    };

    match outcome {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(student_id, error = %err, "Face verification failed closed");
            VerificationResult::REJECTED
        }
    }
}
