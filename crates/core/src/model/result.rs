use thiserror::Error;

use crate::model::ids::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("correct count ({correct}) exceeds total ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("score must be a finite, non-negative number")]
    InvalidScore,
}

/// Server-provided verdict for one question, used by quiz review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview {
    pub question_id: QuestionId,
    pub selected: String,
    pub correct_answer: Option<String>,
    pub is_correct: bool,
}

/// Judge verdict for a submitted attempt. Terminal and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    score: u32,
    correct_count: u32,
    total_count: u32,
    passed: bool,
    review: Vec<QuestionReview>,
}

impl AttemptResult {
    /// Assemble a result from what the judge reported.
    ///
    /// `score` and `passed` are server-authoritative when present. A missing
    /// score is derived as `round(100 * correct / total)`, a missing pass flag
    /// as `score >= passing_threshold`.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::CorrectExceedsTotal` for inconsistent counts and
    /// `ResultError::InvalidScore` for a negative or non-finite score.
    pub fn from_judge(
        correct_count: u32,
        total_count: u32,
        score: Option<f64>,
        passed: Option<bool>,
        passing_threshold: u32,
    ) -> Result<Self, ResultError> {
        if correct_count > total_count {
            return Err(ResultError::CorrectExceedsTotal {
                correct: correct_count,
                total: total_count,
            });
        }

        let score = match score {
            Some(raw) if !raw.is_finite() || raw < 0.0 => return Err(ResultError::InvalidScore),
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Some(raw) => raw.round() as u32,
            None => percent(correct_count, total_count),
        };
        let passed = passed.unwrap_or(score >= passing_threshold);

        Ok(Self {
            score,
            correct_count,
            total_count,
            passed,
            review: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_review(mut self, review: Vec<QuestionReview>) -> Self {
        self.review = review;
        self
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// Same as `total_count`; matches the judge's field name.
    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_count
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn review(&self) -> &[QuestionReview] {
        &self.review
    }

    /// Server verdict for one question, if the judge sent per-question review.
    #[must_use]
    pub fn review_for(&self, question_id: QuestionId) -> Option<&QuestionReview> {
        self.review.iter().find(|r| r.question_id == question_id)
    }
}

/// Rounded integer percentage; zero when `total` is zero.
#[must_use]
pub fn percent(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = u64::from(part) * 100;
    let total = u64::from(total);
    // round half up in integer arithmetic
    u32::try_from((scaled * 2 + total) / (total * 2)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_score_rounds_to_nearest_percent() {
        let result = AttemptResult::from_judge(2, 3, None, None, 60).unwrap();
        assert_eq!(result.score(), 67);
        assert!(result.passed());

        let result = AttemptResult::from_judge(1, 3, None, None, 60).unwrap();
        assert_eq!(result.score(), 33);
        assert!(!result.passed());
    }

    #[test]
    fn half_rounds_up() {
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(1, 200), 1);
        assert_eq!(percent(0, 0), 0);
    }

    #[test]
    fn server_score_and_pass_flag_win() {
        let result = AttemptResult::from_judge(1, 5, Some(90.4), Some(true), 60).unwrap();
        assert_eq!(result.score(), 90);
        assert!(result.passed());
        assert_eq!(result.total_questions(), 5);
    }

    #[test]
    fn inconsistent_counts_are_rejected() {
        let err = AttemptResult::from_judge(6, 5, None, None, 60).unwrap_err();
        assert_eq!(err, ResultError::CorrectExceedsTotal { correct: 6, total: 5 });
    }

    #[test]
    fn negative_score_is_rejected() {
        let err = AttemptResult::from_judge(0, 5, Some(-1.0), None, 60).unwrap_err();
        assert_eq!(err, ResultError::InvalidScore);
    }

    #[test]
    fn review_lookup_by_question() {
        let result = AttemptResult::from_judge(1, 1, None, None, 60)
            .unwrap()
            .with_review(vec![QuestionReview {
                question_id: QuestionId::new(3),
                selected: "B".into(),
                correct_answer: Some("B".into()),
                is_correct: true,
            }]);
        assert!(result.review_for(QuestionId::new(3)).unwrap().is_correct);
        assert!(result.review_for(QuestionId::new(4)).is_none());
    }
}
