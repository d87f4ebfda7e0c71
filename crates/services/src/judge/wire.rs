//! JSON shapes exchanged with the judge and their conversion to domain types.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use lingo_core::model::{
    AttemptDefinition, AttemptKind, AttemptLayout, AttemptResult, Question, QuestionId,
    QuestionReview, ResultError, Section, SectionId, TestId,
};

use crate::error::ApiError;

/// Keys the backend uses when it wraps a definition.
pub(crate) fn definition_keys(kind: AttemptKind) -> &'static [&'static str] {
    match kind {
        AttemptKind::Test => &["test"],
        AttemptKind::Listening => &["listening", "listening_test", "test"],
        AttemptKind::Quiz => &["quiz"],
    }
}

pub(crate) const RESULT_KEYS: &[&str] = &["result", "submission"];

#[derive(Debug, Deserialize)]
pub(crate) struct DefinitionWire {
    id: TestId,
    #[serde(default, alias = "name")]
    title: Value,
    #[serde(default)]
    time_limit_seconds: Option<u32>,
    #[serde(default)]
    time_limit_minutes: Option<u32>,
    #[serde(default)]
    time_limit: Option<u32>,
    #[serde(default)]
    duration_minutes: Option<u32>,
    #[serde(default)]
    questions: Option<Vec<QuestionWire>>,
    #[serde(default)]
    sections: Option<Vec<SectionWire>>,
}

#[derive(Debug, Deserialize)]
struct SectionWire {
    id: SectionId,
    #[serde(default)]
    title: Value,
    #[serde(default, alias = "audio_url", alias = "audio")]
    audio_ref: Value,
    #[serde(default)]
    questions: Option<Vec<QuestionWire>>,
}

#[derive(Debug, Deserialize)]
struct QuestionWire {
    id: QuestionId,
    #[serde(default, alias = "question", alias = "text")]
    prompt: Value,
    #[serde(default)]
    options: Value,
    #[serde(default, alias = "correct_answer")]
    correct_option: Value,
}

impl DefinitionWire {
    /// Later questions reusing an earlier id are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidDefinition` when nothing is left to answer.
    pub(crate) fn into_definition(self, kind: AttemptKind) -> Result<AttemptDefinition, ApiError> {
        let minutes = self
            .time_limit_minutes
            .or(self.time_limit)
            .or(self.duration_minutes);
        let time_limit_secs = self
            .time_limit_seconds
            .or_else(|| minutes.map(|m| m.saturating_mul(60)));

        let mut seen = HashSet::new();
        let layout = match self.sections {
            Some(sections) if kind == AttemptKind::Listening || !sections.is_empty() => AttemptLayout::Sectioned(
                sections
                    .into_iter()
                    .map(|section| section.into_section(&mut seen))
                    .collect(),
            ),
            _ => AttemptLayout::Flat(convert_questions(self.questions, &mut seen)),
        };

        let title = coerce_text("title", &self.title).unwrap_or_default();
        Ok(AttemptDefinition::new(self.id, kind, title, time_limit_secs, layout)?)
    }
}

impl SectionWire {
    fn into_section(self, seen: &mut HashSet<QuestionId>) -> Section {
        Section {
            id: self.id,
            title: coerce_text("section title", &self.title).unwrap_or_default(),
            audio_ref: coerce_text("audio_ref", &self.audio_ref).filter(|r| !r.trim().is_empty()),
            questions: convert_questions(self.questions, seen),
        }
    }
}

fn convert_questions(
    questions: Option<Vec<QuestionWire>>,
    seen: &mut HashSet<QuestionId>,
) -> Vec<Question> {
    questions
        .unwrap_or_default()
        .into_iter()
        .filter(|question| {
            let fresh = seen.insert(question.id);
            if !fresh {
                tracing::warn!(question_id = %question.id, "dropping repeated question id");
            }
            fresh
        })
        .map(QuestionWire::into_question)
        .collect()
}

impl QuestionWire {
    fn into_question(self) -> Question {
        let options = coerce_options(self.id, &self.options);
        let prompt = coerce_text("prompt", &self.prompt).unwrap_or_default();
        let question = Question::new(self.id, prompt, options);
        match coerce_text("correct_option", &self.correct_option) {
            Some(correct) => question.with_correct_option(correct),
            None => question,
        }
    }
}

/// Read a field that should be a string.
///
/// Numbers and booleans are stringified; null and missing become `None`, as
/// does any other shape.
pub(crate) fn coerce_text(field: &'static str, raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        Value::Number(n) => {
            tracing::warn!(field, "expected text, using number {n}");
            Some(n.to_string())
        }
        Value::Bool(b) => {
            tracing::warn!(field, "expected text, using boolean {b}");
            Some(b.to_string())
        }
        _ => {
            tracing::warn!(field, "expected text, ignoring value");
            None
        }
    }
}

/// Read a field that should be a boolean. Anything unreadable is `false`.
pub(crate) fn coerce_flag(field: &'static str, raw: &Value) -> bool {
    match raw {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => {
            tracing::warn!(field, "expected boolean, using number {n}");
            n.as_f64().is_some_and(|v| v != 0.0)
        }
        Value::String(s) => {
            tracing::warn!(field, "expected boolean, using string {s:?}");
            matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes")
        }
        _ => {
            tracing::warn!(field, "expected boolean, using false");
            false
        }
    }
}

/// Read an `options` field that should be a list of strings.
///
/// Lists are kept (numbers and booleans stringified, anything else dropped),
/// a string holding a JSON list is decoded, and every other shape yields an
/// empty list.
pub(crate) fn coerce_options(question_id: QuestionId, raw: &Value) -> Vec<String> {
    match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => {
                    tracing::warn!(%question_id, "dropping non-scalar option");
                    None
                }
            })
            .collect(),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(decoded @ Value::Array(_)) => coerce_options(question_id, &decoded),
            _ => {
                tracing::warn!(%question_id, "options is not a list, using no options");
                Vec::new()
            }
        },
        Value::Null => Vec::new(),
        _ => {
            tracing::warn!(%question_id, "options is not a list, using no options");
            Vec::new()
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultWire {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default, alias = "correct_answers", alias = "correct")]
    correct_count: Option<u32>,
    #[serde(default, alias = "total_questions", alias = "total")]
    total_count: Option<u32>,
    #[serde(default)]
    passed: Option<bool>,
    #[serde(default, alias = "details", alias = "answers")]
    review: Option<Vec<ReviewWire>>,
}

#[derive(Debug, Deserialize)]
struct ReviewWire {
    question_id: QuestionId,
    #[serde(default, alias = "selected_answer")]
    selected: Value,
    #[serde(default)]
    correct_answer: Value,
    #[serde(default)]
    is_correct: Value,
}

impl ResultWire {
    /// `submitted` is the number of answers sent; it stands in for a missing total.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` for inconsistent counts or a bad score.
    pub(crate) fn into_result(
        self,
        submitted: usize,
        passing_threshold: u32,
    ) -> Result<AttemptResult, ResultError> {
        let review: Vec<QuestionReview> = self
            .review
            .unwrap_or_default()
            .into_iter()
            .map(|r| QuestionReview {
                question_id: r.question_id,
                selected: coerce_text("selected_answer", &r.selected).unwrap_or_default(),
                correct_answer: coerce_text("correct_answer", &r.correct_answer),
                is_correct: coerce_flag("is_correct", &r.is_correct),
            })
            .collect();

        let total = self
            .total_count
            .unwrap_or_else(|| u32::try_from(submitted).unwrap_or(u32::MAX));
        let correct = self.correct_count.unwrap_or_else(|| {
            u32::try_from(review.iter().filter(|r| r.is_correct).count()).unwrap_or(u32::MAX)
        });

        Ok(
            AttemptResult::from_judge(correct, total, self.score, self.passed, passing_threshold)?
                .with_review(review),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(kind: AttemptKind, body: Value) -> AttemptDefinition {
        serde_json::from_value::<DefinitionWire>(body)
            .unwrap()
            .into_definition(kind)
            .unwrap()
    }

    #[test]
    fn raw_string_options_become_empty_list() {
        let def = decode(
            AttemptKind::Test,
            json!({
                "id": 1,
                "title": "Greetings",
                "questions": [
                    { "id": 10, "question": "Hola?", "options": "Hello, Bye" },
                    { "id": 11, "question": "Adios?", "options": ["Hello", "Bye"] }
                ]
            }),
        );
        let questions: Vec<_> = def.questions().collect();
        assert!(questions[0].options().is_empty());
        assert_eq!(questions[1].options(), ["Hello", "Bye"]);
    }

    #[test]
    fn json_encoded_option_list_is_decoded() {
        let options = coerce_options(QuestionId::new(1), &json!("[\"A\", \"B\", 3]"));
        assert_eq!(options, vec!["A", "B", "3"]);
    }

    #[test]
    fn unreadable_option_shapes_never_fail() {
        assert!(coerce_options(QuestionId::new(1), &json!({ "a": 1 })).is_empty());
        assert!(coerce_options(QuestionId::new(1), &json!(42)).is_empty());
        assert!(coerce_options(QuestionId::new(1), &Value::Null).is_empty());
        assert_eq!(
            coerce_options(QuestionId::new(1), &json!(["A", null, { "x": 1 }])),
            vec!["A"]
        );
    }

    #[test]
    fn minutes_convert_to_seconds_and_seconds_win() {
        let def = decode(
            AttemptKind::Test,
            json!({ "id": 1, "time_limit": 1, "questions": [{ "id": 1, "question": "Q" }] }),
        );
        assert_eq!(def.time_limit_secs(), Some(60));

        let def = decode(
            AttemptKind::Test,
            json!({
                "id": 1,
                "time_limit": 1,
                "time_limit_seconds": 45,
                "questions": [{ "id": 1, "question": "Q" }]
            }),
        );
        assert_eq!(def.time_limit_secs(), Some(45));
    }

    #[test]
    fn listening_sections_keep_audio_and_empty_sections() {
        let def = decode(
            AttemptKind::Listening,
            json!({
                "id": 5,
                "sections": [
                    { "id": 1, "title": "Part A", "audio_url": "media/a.mp3",
                      "questions": [{ "id": 1, "question": "Q1", "options": ["x", "y"] }] },
                    { "id": 2, "title": "Part B", "audio_url": "", "questions": null }
                ]
            }),
        );
        assert_eq!(def.sections().len(), 2);
        assert_eq!(def.sections()[0].audio_ref.as_deref(), Some("media/a.mp3"));
        assert_eq!(def.sections()[1].audio_ref, None);
        assert!(def.sections()[1].is_empty());
    }

    #[test]
    fn answer_key_survives_only_for_quizzes() {
        let body = json!({
            "id": 2,
            "questions": [{ "id": 1, "question": "Q", "options": ["a"], "correct_answer": "a" }]
        });
        let quiz = decode(AttemptKind::Quiz, body.clone());
        assert_eq!(quiz.questions().next().unwrap().correct_option(), Some("a"));
        let test = decode(AttemptKind::Test, body);
        assert_eq!(test.questions().next().unwrap().correct_option(), None);
    }

    #[test]
    fn definition_without_questions_is_invalid() {
        let err = serde_json::from_value::<DefinitionWire>(json!({ "id": 1, "questions": [] }))
            .unwrap()
            .into_definition(AttemptKind::Test)
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidDefinition(_)));
    }

    #[test]
    fn result_uses_server_counts_and_review() {
        let wire: ResultWire = serde_json::from_value(json!({
            "score": 40,
            "correct_answers": 2,
            "total_questions": 5,
            "details": [
                { "question_id": 1, "selected_answer": "A", "correct_answer": "A", "is_correct": true },
                { "question_id": 3, "selected_answer": "", "correct_answer": "B", "is_correct": false }
            ]
        }))
        .unwrap();
        let result = wire.into_result(5, 60).unwrap();
        assert_eq!(result.score(), 40);
        assert_eq!(result.total_questions(), 5);
        assert!(!result.passed());
        assert_eq!(
            result.review_for(QuestionId::new(3)).unwrap().correct_answer.as_deref(),
            Some("B")
        );
    }

    #[test]
    fn result_without_total_falls_back_to_submitted_count() {
        let wire: ResultWire = serde_json::from_value(json!({ "correct": 3 })).unwrap();
        let result = wire.into_result(4, 60).unwrap();
        assert_eq!(result.total_count(), 4);
        assert_eq!(result.score(), 75);
        assert!(result.passed());
    }

    #[test]
    fn inconsistent_result_is_rejected() {
        let wire: ResultWire =
            serde_json::from_value(json!({ "correct_answers": 6, "total_questions": 5 })).unwrap();
        assert!(wire.into_result(5, 60).is_err());
    }

    #[test]
    fn scalar_question_fields_are_coerced_to_text() {
        let def = decode(
            AttemptKind::Quiz,
            json!({
                "id": 1,
                "questions": [
                    { "id": 1, "question": 42, "options": ["1", "2"], "correct_answer": 1 },
                    { "id": 2, "question": "Ok?", "options": ["a"], "correct_answer": "a" },
                    { "id": 3, "question": { "rich": true }, "correct_answer": [0] }
                ]
            }),
        );
        let questions: Vec<_> = def.questions().collect();
        assert_eq!(questions[0].prompt(), "42");
        assert_eq!(questions[0].correct_option(), Some("1"));
        assert_eq!(questions[1].correct_option(), Some("a"));
        assert_eq!(questions[2].prompt(), "");
        assert_eq!(questions[2].correct_option(), None);
    }

    #[test]
    fn repeated_question_ids_keep_the_first_occurrence() {
        let def = decode(
            AttemptKind::Listening,
            json!({
                "id": 3,
                "sections": [
                    { "id": 1, "questions": [
                        { "id": 1, "question": "first" },
                        { "id": 1, "question": "again" }
                    ] },
                    { "id": 2, "questions": [
                        { "id": 1, "question": "elsewhere" },
                        { "id": 2, "question": "second" }
                    ] }
                ]
            }),
        );
        let prompts: Vec<_> = def.questions().map(|q| q.prompt().to_string()).collect();
        assert_eq!(prompts, vec!["first", "second"]);
        assert_eq!(def.group_lengths(), vec![1, 1]);
    }

    #[test]
    fn every_minutes_field_may_appear_together() {
        let def = decode(
            AttemptKind::Test,
            json!({
                "id": 1,
                "time_limit": 2,
                "duration_minutes": 5,
                "questions": [{ "id": 1, "question": "Q" }]
            }),
        );
        assert_eq!(def.time_limit_secs(), Some(120));

        let def = decode(
            AttemptKind::Test,
            json!({ "id": 1, "duration_minutes": 5, "questions": [{ "id": 1, "question": "Q" }] }),
        );
        assert_eq!(def.time_limit_secs(), Some(300));
    }

    #[test]
    fn review_flags_tolerate_odd_shapes() {
        let wire: ResultWire = serde_json::from_value(json!({
            "total_questions": 4,
            "details": [
                { "question_id": 1, "selected_answer": "A", "is_correct": null },
                { "question_id": 2, "selected_answer": 3, "correct_answer": 3, "is_correct": 1 },
                { "question_id": 3, "selected_answer": null, "is_correct": "true" },
                { "question_id": 4, "is_correct": { "value": true } }
            ]
        }))
        .unwrap();
        let result = wire.into_result(4, 60).unwrap();
        assert_eq!(result.correct_count(), 2);
        let second = result.review_for(QuestionId::new(2)).unwrap();
        assert_eq!(second.selected, "3");
        assert_eq!(second.correct_answer.as_deref(), Some("3"));
        assert!(!result.review_for(QuestionId::new(1)).unwrap().is_correct);
        assert_eq!(result.review_for(QuestionId::new(3)).unwrap().selected, "");
    }
}
