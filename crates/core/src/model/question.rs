use crate::model::ids::QuestionId;

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice item inside an attempt.
///
/// Questions are immutable once built. The prompt is not validated and the
/// option list may be empty when the backend sent options the client could
/// not read; such a question still renders, just with nothing to select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_option: Option<String>,
}

impl Question {
    /// Creates a question without an answer key.
    #[must_use]
    pub fn new(id: QuestionId, prompt: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            options,
            correct_option: None,
        }
    }

    /// Attach the answer key (quiz variant only).
    #[must_use]
    pub fn with_correct_option(mut self, correct: impl Into<String>) -> Self {
        self.correct_option = Some(correct.into());
        self
    }

    /// Drops the answer key so it can never reach a test or listening screen.
    #[must_use]
    pub fn strip_answer_key(mut self) -> Self {
        self.correct_option = None;
        self
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> Option<&str> {
        self.correct_option.as_deref()
    }
}
