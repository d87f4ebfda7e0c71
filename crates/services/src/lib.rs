#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod judge;
pub mod logging;
pub mod playback;
pub mod sessions;
pub mod submission;
pub mod timer;

pub use lingo_core::Clock;

pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, PlaybackError, SessionError, SubmitError};
pub use judge::{HttpJudge, InMemoryJudge, RemoteJudge, StaticToken, TokenProvider};
pub use playback::{AudioPlayer, PlaybackPosition, PlaybackTracker, SectionAudio};
pub use sessions::{AttemptService, AttemptSession, TickOutcome};
pub use submission::SubmissionCoordinator;
pub use timer::{CountdownDriver, Ticker};
