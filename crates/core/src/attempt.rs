use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::countdown::{Countdown, Tick};
use crate::cursor::{CursorMove, NavigationCursor, Position};
use crate::ledger::AnswerLedger;
use crate::model::{AttemptDefinition, AttemptKind, AttemptResult, Question, QuestionId, Section, TestId};
use crate::progress::AttemptProgress;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt has no questions")]
    NoQuestions,

    #[error("question {0} is not part of this attempt")]
    UnknownQuestion(QuestionId),

    #[error("a submission is already in progress")]
    Locked,

    #[error("attempt already completed")]
    Completed,

    #[error("attempt was abandoned")]
    Abandoned,

    #[error("time is up, answers can no longer change")]
    TimeUp,
}

//
// ─── WIRE PAYLOAD ──────────────────────────────────────────────────────────────
//

/// One answer as the judge expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerEntry {
    pub question_id: QuestionId,
    pub selected_answer: String,
}

/// Body of `POST /{kind}/{id}/submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRequest {
    pub answers: Vec<AnswerEntry>,
}

impl SubmissionRequest {
    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    InProgress,
    Submitting,
    Completed,
    /// The session token was rejected; the attempt cannot be submitted.
    Abandoned,
}

/// One user's run through a test, quiz or listening exercise.
///
/// Single owner, single thread: the screen that mounted it holds it and drops
/// it on exit. Ledger keys are always ids of this attempt's questions.
#[derive(Debug, Clone)]
pub struct Attempt {
    definition: AttemptDefinition,
    ledger: AnswerLedger,
    cursor: NavigationCursor,
    countdown: Countdown,
    status: AttemptStatus,
    started_at: DateTime<Utc>,
    result: Option<AttemptResult>,
}

impl Attempt {
    /// Create the attempt and start its countdown if the definition is timed.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NoQuestions` if there is nothing to navigate.
    pub fn new(definition: AttemptDefinition, started_at: DateTime<Utc>) -> Result<Self, AttemptError> {
        let cursor = NavigationCursor::sectioned(&definition.group_lengths())
            .ok_or(AttemptError::NoQuestions)?;
        let mut countdown = Countdown::new(definition.time_limit_secs());
        countdown.start();

        Ok(Self {
            definition,
            ledger: AnswerLedger::new(),
            cursor,
            countdown,
            status: AttemptStatus::InProgress,
            started_at,
            result: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> TestId {
        self.definition.id()
    }

    #[must_use]
    pub fn kind(&self) -> AttemptKind {
        self.definition.kind()
    }

    #[must_use]
    pub fn definition(&self) -> &AttemptDefinition {
        &self.definition
    }

    #[must_use]
    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn result(&self) -> Option<&AttemptResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        self.countdown.remaining_secs()
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.cursor.position()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.cursor.global_index()
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.cursor.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.definition.questions().nth(self.cursor.global_index())
    }

    /// Section on screen; `None` for flat attempts.
    #[must_use]
    pub fn current_section(&self) -> Option<&Section> {
        self.definition.sections().get(self.cursor.position().section)
    }

    #[must_use]
    pub fn answer_for(&self, question_id: QuestionId) -> Option<&str> {
        self.ledger.get(question_id)
    }

    /// Record the user's choice for a question, replacing any earlier one.
    ///
    /// `option` is not checked against the question's listed options.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::UnknownQuestion` for ids outside this attempt,
    /// `TimeUp` once the countdown expired, and `Locked`, `Completed` or
    /// `Abandoned` when the attempt no longer accepts input.
    pub fn select_answer(
        &mut self,
        question_id: QuestionId,
        option: impl Into<String>,
    ) -> Result<(), AttemptError> {
        self.ensure_accepting()?;
        if self.countdown.is_expired() {
            return Err(AttemptError::TimeUp);
        }
        if !self.definition.contains_question(question_id) {
            return Err(AttemptError::UnknownQuestion(question_id));
        }
        self.ledger.set(question_id, option);
        Ok(())
    }

    pub fn next(&mut self) -> CursorMove {
        self.cursor.next()
    }

    pub fn previous(&mut self) -> CursorMove {
        self.cursor.previous()
    }

    /// Jump to a question. Out-of-range targets are ignored and return `false`.
    pub fn set_position(&mut self, section: Option<usize>, item: usize) -> bool {
        self.cursor.set_position(section, item)
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Tick {
        if matches!(self.status, AttemptStatus::Completed | AttemptStatus::Abandoned) {
            return Tick::Suppressed;
        }
        self.countdown.tick()
    }

    /// Stop the countdown, e.g. when the screen goes away.
    pub fn cancel_countdown(&mut self) {
        self.countdown.cancel();
    }

    /// Wire payload: every question in order, unanswered ones as `""`.
    #[must_use]
    pub fn submission_request(&self) -> SubmissionRequest {
        let answers = self
            .definition
            .questions()
            .map(|question| AnswerEntry {
                question_id: question.id(),
                selected_answer: self.ledger.get(question.id()).unwrap_or_default().to_string(),
            })
            .collect();
        SubmissionRequest { answers }
    }

    /// Lock the attempt for submission and hand out the payload.
    ///
    /// Still allowed after expiry so a failed forced submission can be retried.
    ///
    /// # Errors
    ///
    /// Returns `Locked` while another submission is pending, `Completed` after
    /// a result arrived, `Abandoned` after an auth failure.
    pub fn begin_submission(&mut self) -> Result<SubmissionRequest, AttemptError> {
        self.ensure_accepting()?;
        self.status = AttemptStatus::Submitting;
        Ok(self.submission_request())
    }

    /// Unlock after a failed submission; answers are untouched.
    pub fn fail_submission(&mut self) {
        if self.status == AttemptStatus::Submitting {
            self.status = AttemptStatus::InProgress;
        }
    }

    /// Store the judge's verdict. The first result wins.
    pub fn complete(&mut self, result: AttemptResult) -> &AttemptResult {
        self.countdown.cancel();
        self.status = AttemptStatus::Completed;
        self.result.get_or_insert(result)
    }

    pub fn abandon(&mut self) {
        self.countdown.cancel();
        self.status = AttemptStatus::Abandoned;
    }

    /// Start over: clear answers, rewind, drop any result, restart the countdown.
    pub fn reset(&mut self) {
        self.ledger.clear();
        self.cursor.rewind();
        self.result = None;
        self.status = AttemptStatus::InProgress;
        self.countdown.start();
    }

    #[must_use]
    pub fn progress(&self) -> AttemptProgress {
        AttemptProgress::new(self.question_count(), self.ledger.count())
    }

    fn ensure_accepting(&self) -> Result<(), AttemptError> {
        match self.status {
            AttemptStatus::InProgress => Ok(()),
            AttemptStatus::Submitting => Err(AttemptError::Locked),
            AttemptStatus::Completed => Err(AttemptError::Completed),
            AttemptStatus::Abandoned => Err(AttemptError::Abandoned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttemptLayout, SectionId};
    use crate::time::fixed_now;

    fn question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec!["A".into(), "B".into(), "C".into()],
        )
    }

    fn five_question_test(limit: Option<u32>) -> Attempt {
        let definition = AttemptDefinition::new(
            TestId::new(1),
            AttemptKind::Test,
            "Unit test",
            limit,
            AttemptLayout::Flat((1..=5).map(question).collect()),
        )
        .unwrap();
        Attempt::new(definition, fixed_now()).unwrap()
    }

    #[test]
    fn unanswered_questions_are_sent_as_empty_strings() {
        let mut attempt = five_question_test(None);
        attempt.select_answer(QuestionId::new(1), "A").unwrap();
        attempt.select_answer(QuestionId::new(2), "B").unwrap();
        attempt.select_answer(QuestionId::new(4), "C").unwrap();

        let request = attempt.submission_request();
        let pairs: Vec<(u64, &str)> = request
            .answers
            .iter()
            .map(|a| (a.question_id.value(), a.selected_answer.as_str()))
            .collect();
        assert_eq!(pairs, vec![(1, "A"), (2, "B"), (3, ""), (4, "C"), (5, "")]);
    }

    #[test]
    fn unknown_question_never_enters_ledger() {
        let mut attempt = five_question_test(None);
        let err = attempt.select_answer(QuestionId::new(42), "A").unwrap_err();
        assert_eq!(err, AttemptError::UnknownQuestion(QuestionId::new(42)));
        assert_eq!(attempt.ledger().count(), 0);
    }

    #[test]
    fn option_outside_listed_options_is_accepted() {
        let mut attempt = five_question_test(None);
        attempt.select_answer(QuestionId::new(1), "Z").unwrap();
        assert_eq!(attempt.answer_for(QuestionId::new(1)), Some("Z"));
    }

    #[test]
    fn submission_locks_until_failure_unlocks() {
        let mut attempt = five_question_test(None);
        attempt.select_answer(QuestionId::new(1), "A").unwrap();
        attempt.begin_submission().unwrap();
        assert_eq!(attempt.begin_submission().unwrap_err(), AttemptError::Locked);
        assert_eq!(
            attempt.select_answer(QuestionId::new(2), "B").unwrap_err(),
            AttemptError::Locked
        );

        attempt.fail_submission();
        assert_eq!(attempt.status(), AttemptStatus::InProgress);
        assert_eq!(attempt.answer_for(QuestionId::new(1)), Some("A"));
    }

    #[test]
    fn completion_is_terminal_and_first_result_wins() {
        let mut attempt = five_question_test(Some(60));
        attempt.begin_submission().unwrap();
        let first = AttemptResult::from_judge(3, 5, None, None, 60).unwrap();
        let second = AttemptResult::from_judge(0, 5, None, None, 60).unwrap();
        attempt.complete(first.clone());
        attempt.complete(second);
        assert_eq!(attempt.result(), Some(&first));
        assert_eq!(attempt.begin_submission().unwrap_err(), AttemptError::Completed);
        assert_eq!(attempt.tick(), Tick::Suppressed);
    }

    #[test]
    fn reset_clears_answers_position_and_restarts_countdown() {
        let mut attempt = five_question_test(Some(30));
        attempt.select_answer(QuestionId::new(3), "C").unwrap();
        attempt.next();
        attempt.next();
        for _ in 0..10 {
            attempt.tick();
        }
        assert_eq!(attempt.remaining_secs(), Some(20));

        attempt.reset();
        assert_eq!(attempt.ledger().count(), 0);
        assert_eq!(attempt.current_index(), 0);
        assert_eq!(attempt.remaining_secs(), Some(30));
        assert_eq!(attempt.status(), AttemptStatus::InProgress);
    }

    #[test]
    fn current_question_follows_cursor_across_sections() {
        let definition = AttemptDefinition::new(
            TestId::new(9),
            AttemptKind::Listening,
            "Listening",
            None,
            AttemptLayout::Sectioned(vec![
                Section {
                    id: SectionId::new(1),
                    title: "One".into(),
                    audio_ref: Some("one.mp3".into()),
                    questions: vec![question(10)],
                },
                Section {
                    id: SectionId::new(2),
                    title: "Two".into(),
                    audio_ref: Some("two.mp3".into()),
                    questions: vec![question(20), question(21)],
                },
            ]),
        )
        .unwrap();
        let mut attempt = Attempt::new(definition, fixed_now()).unwrap();
        assert_eq!(attempt.current_question().unwrap().id(), QuestionId::new(10));
        attempt.next();
        assert_eq!(attempt.current_section().unwrap().id, SectionId::new(2));
        assert_eq!(attempt.current_question().unwrap().id(), QuestionId::new(20));
        assert!(!attempt.set_position(Some(1), 2));
        assert_eq!(attempt.current_question().unwrap().id(), QuestionId::new(20));
    }

    #[test]
    fn expired_attempt_locks_answers_but_still_submits() {
        let mut attempt = five_question_test(Some(1));
        attempt.select_answer(QuestionId::new(1), "A").unwrap();
        assert_eq!(attempt.tick(), Tick::Expired);

        assert_eq!(
            attempt.select_answer(QuestionId::new(2), "B").unwrap_err(),
            AttemptError::TimeUp
        );
        assert_eq!(attempt.answer_for(QuestionId::new(1)), Some("A"));
        assert_eq!(attempt.answer_for(QuestionId::new(2)), None);
        assert!(matches!(attempt.next(), CursorMove::Moved(_)));

        attempt.begin_submission().unwrap();
        attempt.fail_submission();
        attempt.begin_submission().unwrap();
    }

    #[test]
    fn abandoned_attempt_rejects_input() {
        let mut attempt = five_question_test(None);
        attempt.abandon();
        assert_eq!(
            attempt.select_answer(QuestionId::new(1), "A").unwrap_err(),
            AttemptError::Abandoned
        );
    }
}
