use std::collections::HashMap;

use crate::model::QuestionId;

/// In-memory mapping of answered questions to the selected option.
///
/// The ledger knows nothing about which questions exist; `Attempt` guards
/// the keys before writing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    entries: HashMap<QuestionId, String>,
}

impl AnswerLedger {
    /// Empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Option chosen for `question_id`, if any.
    #[must_use]
    pub fn get(&self, question_id: QuestionId) -> Option<&str> {
        self.entries.get(&question_id).map(String::as_str)
    }

    /// Insert or overwrite the selection; returns the previous one.
    pub fn set(&mut self, question_id: QuestionId, option: impl Into<String>) -> Option<String> {
        self.entries.insert(question_id, option.into())
    }

    /// True once any option was recorded for the question.
    #[must_use]
    pub fn is_answered(&self, question_id: QuestionId) -> bool {
        self.entries.contains_key(&question_id)
    }

    /// Number of answered questions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Forget every selection.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
