use std::sync::Arc;

use lingo_core::model::{AttemptKind, TestId};
use lingo_core::{Attempt, AttemptError};

use crate::Clock;
use crate::error::SessionError;
use crate::judge::RemoteJudge;
use crate::submission::SubmissionCoordinator;
use super::service::AttemptSession;

/// Starts attempts against a remote judge.
#[derive(Clone)]
pub struct AttemptService {
    clock: Clock,
    judge: Arc<dyn RemoteJudge>,
}

impl AttemptService {
    #[must_use]
    pub fn new(judge: Arc<dyn RemoteJudge>) -> Self {
        Self {
            clock: Clock::default(),
            judge,
        }
    }

    /// Override the clock (useful for deterministic tests).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Fetch a definition and start a fresh attempt on it.
    ///
    /// The countdown starts immediately when the definition is timed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Auth` for a rejected token, `SessionError::Empty`
    /// when the definition has no questions, and `SessionError::Fetch` for
    /// any other load failure.
    pub async fn start(&self, kind: AttemptKind, id: TestId) -> Result<AttemptSession, SessionError> {
        let definition = self
            .judge
            .fetch(kind, id)
            .await
            .map_err(SessionError::from_fetch)?;

        let attempt = Attempt::new(definition, self.clock.now()).map_err(|err| match err {
            AttemptError::NoQuestions => SessionError::Empty,
            other => SessionError::Attempt(other),
        })?;
        tracing::info!(
            %kind,
            %id,
            questions = attempt.question_count(),
            time_limit_secs = ?attempt.countdown().limit_secs(),
            "attempt started"
        );

        let coordinator = Arc::new(SubmissionCoordinator::new(Arc::clone(&self.judge), kind, id));
        Ok(AttemptSession::new(attempt, coordinator, self.clock))
    }
}
