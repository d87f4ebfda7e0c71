//! The remote judge: fetches attempt definitions and scores submissions.

mod envelope;
mod http;
mod memory;
mod wire;

use async_trait::async_trait;

use lingo_core::SubmissionRequest;
use lingo_core::model::{AttemptDefinition, AttemptKind, AttemptResult, TestId};

use crate::error::ApiError;

pub use envelope::unwrap_envelope;
pub use http::HttpJudge;
pub use memory::{InMemoryJudge, RecordedSubmission, ScriptedFailure};

/// Contract for the service that owns test content and scoring.
#[async_trait]
pub trait RemoteJudge: Send + Sync {
    /// Fetch the definition of an attempt.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for a rejected token, or other API errors.
    async fn fetch(&self, kind: AttemptKind, id: TestId) -> Result<AttemptDefinition, ApiError>;

    /// Submit answers and return the verdict.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the payload is refused, or other API errors.
    async fn submit(
        &self,
        kind: AttemptKind,
        id: TestId,
        request: &SubmissionRequest,
    ) -> Result<AttemptResult, ApiError>;
}

/// Supplies the bearer token attached to each request.
pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Token fixed at construction; `None` sends unauthenticated requests.
#[derive(Clone, Debug, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}
