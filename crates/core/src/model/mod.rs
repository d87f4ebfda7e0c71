mod definition;
mod ids;
mod question;
mod result;

pub use definition::{AttemptDefinition, AttemptKind, AttemptLayout, DefinitionError, Section};
pub use ids::{ParseIdError, QuestionId, SectionId, TestId};
pub use question::Question;
pub use result::{AttemptResult, QuestionReview, ResultError, percent};
