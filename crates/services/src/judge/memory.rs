use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use lingo_core::SubmissionRequest;
use lingo_core::model::{
    AttemptDefinition, AttemptKind, AttemptResult, QuestionId, QuestionReview, TestId,
};

use super::RemoteJudge;
use crate::config::DEFAULT_PASSING_SCORE;
use crate::error::ApiError;

/// Failure a scripted judge can return in place of a real one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedFailure {
    Unavailable,
    Unauthorized,
    Rejected(String),
    NotFound,
}

impl ScriptedFailure {
    fn to_error(&self) -> ApiError {
        match self {
            ScriptedFailure::Unavailable => ApiError::Unavailable("connection refused".into()),
            ScriptedFailure::Unauthorized => ApiError::Unauthorized,
            ScriptedFailure::Rejected(message) => ApiError::Rejected {
                message: message.clone(),
            },
            ScriptedFailure::NotFound => ApiError::Status(reqwest::StatusCode::NOT_FOUND),
        }
    }
}

/// A submission as the judge received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSubmission {
    pub kind: AttemptKind,
    pub id: TestId,
    pub request: SubmissionRequest,
}

type Key = (AttemptKind, TestId);

#[derive(Default)]
struct JudgeState {
    definitions: HashMap<Key, AttemptDefinition>,
    answer_keys: HashMap<Key, HashMap<QuestionId, String>>,
    fetch_failures: HashMap<Key, ScriptedFailure>,
    submit_failures: HashMap<Key, VecDeque<ScriptedFailure>>,
    submissions: Vec<RecordedSubmission>,
}

/// Scripted in-memory judge for tests and offline prototyping.
///
/// Scores submissions against answer keys registered with `set_answer_key`,
/// the way the real backend does. Optional latency makes in-flight windows
/// observable.
#[derive(Clone)]
pub struct InMemoryJudge {
    state: Arc<Mutex<JudgeState>>,
    latency: Option<Duration>,
    passing_threshold: u32,
}

impl Default for InMemoryJudge {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryJudge {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(JudgeState::default())),
            latency: None,
            passing_threshold: DEFAULT_PASSING_SCORE,
        }
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    #[must_use]
    pub fn with_passing_threshold(mut self, threshold: u32) -> Self {
        self.passing_threshold = threshold;
        self
    }

    pub fn add_definition(&self, definition: AttemptDefinition) {
        let key = (definition.kind(), definition.id());
        self.lock().definitions.insert(key, definition);
    }

    pub fn set_answer_key<I, S>(&self, kind: AttemptKind, id: TestId, key: I)
    where
        I: IntoIterator<Item = (QuestionId, S)>,
        S: Into<String>,
    {
        let key = key.into_iter().map(|(q, a)| (q, a.into())).collect();
        self.lock().answer_keys.insert((kind, id), key);
    }

    pub fn fail_fetch(&self, kind: AttemptKind, id: TestId, failure: ScriptedFailure) {
        self.lock().fetch_failures.insert((kind, id), failure);
    }

    /// Queue a failure for the next submission; later submissions are scored normally.
    pub fn fail_next_submit(&self, kind: AttemptKind, id: TestId, failure: ScriptedFailure) {
        self.lock()
            .submit_failures
            .entry((kind, id))
            .or_default()
            .push_back(failure);
    }

    #[must_use]
    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.lock().submissions.clone()
    }

    #[must_use]
    pub fn submission_count(&self) -> usize {
        self.lock().submissions.len()
    }

    fn lock(&self) -> MutexGuard<'_, JudgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn score(
        &self,
        key: Option<&HashMap<QuestionId, String>>,
        request: &SubmissionRequest,
    ) -> Result<AttemptResult, ApiError> {
        let review: Vec<QuestionReview> = request
            .answers
            .iter()
            .map(|answer| {
                let correct_answer = key.and_then(|k| k.get(&answer.question_id)).cloned();
                QuestionReview {
                    question_id: answer.question_id,
                    selected: answer.selected_answer.clone(),
                    is_correct: correct_answer.as_deref() == Some(answer.selected_answer.as_str()),
                    correct_answer,
                }
            })
            .collect();

        let correct = review.iter().filter(|r| r.is_correct).count();
        let to_u32 = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        Ok(AttemptResult::from_judge(
            to_u32(correct),
            to_u32(request.len()),
            None,
            None,
            self.passing_threshold,
        )?
        .with_review(review))
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RemoteJudge for InMemoryJudge {
    async fn fetch(&self, kind: AttemptKind, id: TestId) -> Result<AttemptDefinition, ApiError> {
        self.simulate_latency().await;
        let state = self.lock();
        if let Some(failure) = state.fetch_failures.get(&(kind, id)) {
            return Err(failure.to_error());
        }
        state
            .definitions
            .get(&(kind, id))
            .cloned()
            .ok_or(ApiError::Status(reqwest::StatusCode::NOT_FOUND))
    }

    async fn submit(
        &self,
        kind: AttemptKind,
        id: TestId,
        request: &SubmissionRequest,
    ) -> Result<AttemptResult, ApiError> {
        {
            let mut state = self.lock();
            state.submissions.push(RecordedSubmission {
                kind,
                id,
                request: request.clone(),
            });
        }
        self.simulate_latency().await;

        let mut state = self.lock();
        if let Some(failure) = state
            .submit_failures
            .get_mut(&(kind, id))
            .and_then(VecDeque::pop_front)
        {
            return Err(failure.to_error());
        }
        if request.is_empty() {
            return Err(ApiError::Rejected {
                message: "answers must not be empty".into(),
            });
        }
        self.score(state.answer_keys.get(&(kind, id)), request)
    }
}
