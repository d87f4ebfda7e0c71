#![forbid(unsafe_code)]

pub mod attempt;
pub mod countdown;
pub mod cursor;
pub mod ledger;
pub mod model;
pub mod progress;
pub mod time;

pub use attempt::{AnswerEntry, Attempt, AttemptError, AttemptStatus, SubmissionRequest};
pub use countdown::{Countdown, CountdownState, Tick};
pub use cursor::{CursorMove, NavigationCursor, Position};
pub use ledger::AnswerLedger;
pub use time::Clock;
