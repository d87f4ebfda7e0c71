use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lingo_core::SubmissionRequest;
use lingo_core::model::{AttemptKind, AttemptResult, TestId};

use crate::error::SubmitError;
use crate::judge::RemoteJudge;

#[derive(Debug, Clone)]
enum SubmitState {
    Idle,
    Pending,
    Done(AttemptResult),
}

/// Guarantees at most one network submission per attempt.
///
/// A call while another is pending is refused with `SubmitError::InFlight`;
/// a call after success gets the cached result. Failures (and a dropped
/// in-flight future) release the guard so the caller may retry.
pub struct SubmissionCoordinator {
    judge: Arc<dyn RemoteJudge>,
    kind: AttemptKind,
    id: TestId,
    state: Mutex<SubmitState>,
}

impl SubmissionCoordinator {
    #[must_use]
    pub fn new(judge: Arc<dyn RemoteJudge>, kind: AttemptKind, id: TestId) -> Self {
        Self {
            judge,
            kind,
            id,
            state: Mutex::new(SubmitState::Idle),
        }
    }

    /// Submit once, or hand back the result of the earlier submission.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::InFlight` while another call is pending and
    /// `SubmitError::Api` when the judge call fails.
    pub async fn submit(&self, request: &SubmissionRequest) -> Result<AttemptResult, SubmitError> {
        {
            let mut state = self.lock();
            match &*state {
                SubmitState::Pending => {
                    tracing::debug!(kind = %self.kind, id = %self.id, "submission already in flight");
                    return Err(SubmitError::InFlight);
                }
                SubmitState::Done(result) => return Ok(result.clone()),
                SubmitState::Idle => *state = SubmitState::Pending,
            }
        }

        let mut pending = PendingGuard {
            state: &self.state,
            settled: false,
        };
        let outcome = self.judge.submit(self.kind, self.id, request).await;
        pending.settled = true;

        let mut state = self.lock();
        match outcome {
            Ok(result) => {
                if matches!(*state, SubmitState::Pending) {
                    *state = SubmitState::Done(result.clone());
                }
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(kind = %self.kind, id = %self.id, error = %err, "submission failed");
                if matches!(*state, SubmitState::Pending) {
                    *state = SubmitState::Idle;
                }
                Err(err.into())
            }
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(*self.lock(), SubmitState::Pending)
    }

    /// The cached verdict, once a submission succeeded.
    #[must_use]
    pub fn result(&self) -> Option<AttemptResult> {
        match &*self.lock() {
            SubmitState::Done(result) => Some(result.clone()),
            _ => None,
        }
    }

    /// Forget the cached verdict so a restarted attempt can submit again.
    ///
    /// An in-flight call that finishes after a reset does not repopulate the cache.
    pub fn reset(&self) {
        *self.lock() = SubmitState::Idle;
    }

    fn lock(&self) -> MutexGuard<'_, SubmitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the pending flag if the submitting future is dropped mid-call.
struct PendingGuard<'a> {
    state: &'a Mutex<SubmitState>,
    settled: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, SubmitState::Pending) {
            *state = SubmitState::Idle;
        }
    }
}
