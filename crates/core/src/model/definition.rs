use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, SectionId, TestId};
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DefinitionError {
    #[error("attempt has no questions")]
    NoQuestions,

    #[error("duplicate question id {0}")]
    DuplicateQuestion(QuestionId),
}

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// Which detail screen an attempt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptKind {
    Test,
    Listening,
    Quiz,
}

impl AttemptKind {
    /// REST collection segment for this kind.
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            AttemptKind::Test => "tests",
            AttemptKind::Listening => "listening",
            AttemptKind::Quiz => "quizzes",
        }
    }

    /// Only quizzes keep the answer key on the client before submission.
    #[must_use]
    pub fn keeps_answer_key(self) -> bool {
        matches!(self, AttemptKind::Quiz)
    }
}

impl fmt::Display for AttemptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AttemptKind::Test => "test",
            AttemptKind::Listening => "listening",
            AttemptKind::Quiz => "quiz",
        };
        f.write_str(label)
    }
}

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

/// A group of listening questions that share one audio clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    pub audio_ref: Option<String>,
    pub questions: Vec<Question>,
}

impl Section {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

//
// ─── DEFINITION ────────────────────────────────────────────────────────────────
//

/// Question arrangement of an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptLayout {
    Flat(Vec<Question>),
    Sectioned(Vec<Section>),
}

/// Fetched, immutable description of a test, quiz or listening exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptDefinition {
    id: TestId,
    kind: AttemptKind,
    title: String,
    time_limit_secs: Option<u32>,
    layout: AttemptLayout,
}

impl AttemptDefinition {
    /// Build a definition, stripping the answer key unless `kind` keeps it.
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError::NoQuestions` if no section holds a question, and
    /// `DefinitionError::DuplicateQuestion` if two questions share an id.
    pub fn new(
        id: TestId,
        kind: AttemptKind,
        title: impl Into<String>,
        time_limit_secs: Option<u32>,
        layout: AttemptLayout,
    ) -> Result<Self, DefinitionError> {
        let layout = if kind.keeps_answer_key() {
            layout
        } else {
            strip_layout(layout)
        };

        let definition = Self {
            id,
            kind,
            title: title.into(),
            time_limit_secs,
            layout,
        };

        let mut seen = std::collections::HashSet::new();
        let mut any = false;
        for question in definition.questions() {
            any = true;
            if !seen.insert(question.id()) {
                return Err(DefinitionError::DuplicateQuestion(question.id()));
            }
        }
        if !any {
            return Err(DefinitionError::NoQuestions);
        }

        Ok(definition)
    }

    #[must_use]
    pub fn id(&self) -> TestId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> AttemptKind {
        self.kind
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> Option<u32> {
        self.time_limit_secs
    }

    #[must_use]
    pub fn layout(&self) -> &AttemptLayout {
        &self.layout
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        match &self.layout {
            AttemptLayout::Flat(_) => &[],
            AttemptLayout::Sectioned(sections) => sections.as_slice(),
        }
    }

    /// All questions in display order, sections flattened.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        let no_questions: &[Question] = &[];
        let no_sections: &[Section] = &[];
        let (flat, sections) = match &self.layout {
            AttemptLayout::Flat(questions) => (questions.as_slice(), no_sections),
            AttemptLayout::Sectioned(sections) => (no_questions, sections.as_slice()),
        };
        flat.iter()
            .chain(sections.iter().flat_map(|section| section.questions.iter()))
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions().count()
    }

    /// Item count per navigable group; a flat layout is one group.
    #[must_use]
    pub fn group_lengths(&self) -> Vec<usize> {
        match &self.layout {
            AttemptLayout::Flat(questions) => vec![questions.len()],
            AttemptLayout::Sectioned(sections) => {
                sections.iter().map(|section| section.questions.len()).collect()
            }
        }
    }

    #[must_use]
    pub fn contains_question(&self, id: QuestionId) -> bool {
        self.questions().any(|question| question.id() == id)
    }
}

fn strip_layout(layout: AttemptLayout) -> AttemptLayout {
    match layout {
        AttemptLayout::Flat(questions) => AttemptLayout::Flat(
            questions.into_iter().map(Question::strip_answer_key).collect(),
        ),
        AttemptLayout::Sectioned(sections) => AttemptLayout::Sectioned(
            sections
                .into_iter()
                .map(|section| Section {
                    questions: section
                        .questions
                        .into_iter()
                        .map(Question::strip_answer_key)
                        .collect(),
                    ..section
                })
                .collect(),
        ),
    }
}
