use std::sync::Arc;

use chrono::{DateTime, Utc};

use lingo_core::model::{AttemptDefinition, AttemptKind, AttemptResult, Question, QuestionId, Section, TestId};
use lingo_core::progress::AttemptProgress;
use lingo_core::{Attempt, AttemptStatus, CursorMove, Position, Tick};

use crate::Clock;
use crate::error::{ApiError, SessionError, SubmitError};
use crate::submission::SubmissionCoordinator;
use crate::timer::Ticker;

//
// ─── TICK OUTCOME ──────────────────────────────────────────────────────────────
//

/// What one second of countdown did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Untimed, or the countdown was cancelled.
    Idle,
    Running { remaining: u32 },
    /// Time ran out and the answers were submitted.
    Submitted(AttemptResult),
    /// The attempt is already finished; later ticks are ignored.
    Stopped,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// A live attempt plus the machinery to submit it.
///
/// Owned by whichever screen mounted it. Dropping the session discards
/// answers; timers driven from it stop with it.
pub struct AttemptSession {
    attempt: Attempt,
    coordinator: Arc<SubmissionCoordinator>,
    clock: Clock,
    submitted_at: Option<DateTime<Utc>>,
}

impl AttemptSession {
    pub(crate) fn new(attempt: Attempt, coordinator: Arc<SubmissionCoordinator>, clock: Clock) -> Self {
        Self {
            attempt,
            coordinator,
            clock,
            submitted_at: None,
        }
    }

    #[must_use]
    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    #[must_use]
    pub fn id(&self) -> TestId {
        self.attempt.id()
    }

    #[must_use]
    pub fn kind(&self) -> AttemptKind {
        self.attempt.kind()
    }

    #[must_use]
    pub fn definition(&self) -> &AttemptDefinition {
        self.attempt.definition()
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.attempt.status()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.attempt.started_at()
    }

    /// When the verdict arrived, if it has.
    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    #[must_use]
    pub fn result(&self) -> Option<&AttemptResult> {
        self.attempt.result()
    }

    /// Shared handle for callers that submit from elsewhere.
    #[must_use]
    pub fn coordinator(&self) -> Arc<SubmissionCoordinator> {
        Arc::clone(&self.coordinator)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.attempt.current_question()
    }

    #[must_use]
    pub fn current_section(&self) -> Option<&Section> {
        self.attempt.current_section()
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.attempt.position()
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<&str> {
        self.attempt.answer_for(question_id)
    }

    #[must_use]
    pub fn progress(&self) -> AttemptProgress {
        self.attempt.progress()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        self.attempt.remaining_secs()
    }

    /// # Errors
    ///
    /// Returns `SessionError::Attempt` for unknown questions or a locked attempt.
    pub fn select_answer(
        &mut self,
        question_id: QuestionId,
        option: impl Into<String>,
    ) -> Result<(), SessionError> {
        Ok(self.attempt.select_answer(question_id, option)?)
    }

    pub fn next(&mut self) -> CursorMove {
        self.attempt.next()
    }

    pub fn previous(&mut self) -> CursorMove {
        self.attempt.previous()
    }

    pub fn set_position(&mut self, section: Option<usize>, item: usize) -> bool {
        self.attempt.set_position(section, item)
    }

    /// Advance one second; on expiry submit whatever has been answered.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`AttemptSession::submit`] when the forced
    /// submission fails.
    pub async fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        match self.attempt.tick() {
            Tick::Idle => Ok(TickOutcome::Idle),
            Tick::Running { remaining } => Ok(TickOutcome::Running { remaining }),
            Tick::Suppressed => Ok(TickOutcome::Stopped),
            Tick::Expired => {
                tracing::info!(
                    kind = %self.kind(),
                    id = %self.id(),
                    answered = self.attempt.ledger().count(),
                    "time is up, submitting"
                );
                self.submit().await.map(TickOutcome::Submitted)
            }
        }
    }

    /// Tick once per `ticker` period until the countdown settles.
    ///
    /// Returns the verdict of the forced submission, the existing result if
    /// the attempt finished some other way, or `None` when there is no
    /// countdown to wait for.
    ///
    /// # Errors
    ///
    /// Returns the forced submission's error.
    pub async fn run_countdown(
        &mut self,
        ticker: &mut Ticker,
    ) -> Result<Option<AttemptResult>, SessionError> {
        loop {
            ticker.tick().await;
            match self.tick().await? {
                TickOutcome::Running { .. } => {}
                TickOutcome::Submitted(result) => return Ok(Some(result)),
                TickOutcome::Stopped => return Ok(self.result().cloned()),
                TickOutcome::Idle => return Ok(None),
            }
        }
    }

    /// Submit the current answers, or return the verdict already received.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Submission` for a failed call (answers are kept),
    /// `SessionError::Auth` when the token was rejected, and
    /// `SessionError::AlreadySubmitting` when another caller is mid-submission.
    pub async fn submit(&mut self) -> Result<AttemptResult, SessionError> {
        match self.attempt.status() {
            AttemptStatus::Completed => {
                if let Some(result) = self.attempt.result() {
                    return Ok(result.clone());
                }
            }
            AttemptStatus::Abandoned => return Err(SessionError::Auth),
            AttemptStatus::InProgress | AttemptStatus::Submitting => {}
        }

        let request = self.attempt.begin_submission()?;
        let mut pending = PendingAttempt {
            attempt: &mut self.attempt,
            settled: false,
        };
        let outcome = self.coordinator.submit(&request).await;
        pending.settled = true;

        match outcome {
            Ok(result) => {
                let result = pending.attempt.complete(result).clone();
                self.submitted_at = Some(self.clock.now());
                tracing::info!(
                    score = result.score(),
                    passed = result.passed(),
                    elapsed_secs = self.clock.elapsed_secs(pending.attempt.started_at()),
                    "attempt completed"
                );
                Ok(result)
            }
            Err(SubmitError::Api(ApiError::Unauthorized)) => {
                pending.attempt.abandon();
                Err(SessionError::Auth)
            }
            Err(err) => {
                pending.attempt.fail_submission();
                Err(SessionError::from_submit(err))
            }
        }
    }

    /// Start over with a clean ledger and a fresh countdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitting` while a submission is in flight.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.coordinator.is_pending() {
            return Err(SessionError::AlreadySubmitting);
        }
        self.attempt.reset();
        self.coordinator.reset();
        self.submitted_at = None;
        Ok(())
    }

    /// Stop the countdown, e.g. when the screen loses focus for good.
    pub fn cancel_countdown(&mut self) {
        self.attempt.cancel_countdown();
    }
}

/// Unlocks the attempt if the submitting future is dropped mid-call.
struct PendingAttempt<'a> {
    attempt: &'a mut Attempt,
    settled: bool,
}

impl Drop for PendingAttempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.attempt.fail_submission();
        }
    }
}
