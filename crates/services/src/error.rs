//! Shared error types for the services crate.

use thiserror::Error;

use lingo_core::AttemptError;
use lingo_core::model::{DefinitionError, ResultError};

/// Failures at the remote judge boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("judge unavailable: {0}")]
    Unavailable(String),
    #[error("session token is missing or expired")]
    Unauthorized,
    #[error("request rejected: {message}")]
    Rejected { message: String },
    #[error("judge returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error(transparent)]
    InvalidDefinition(#[from] DefinitionError),
    #[error(transparent)]
    InvalidResult(#[from] ResultError),
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl ApiError {
    /// The request never produced a usable HTTP response.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Http(_) | ApiError::Unavailable(_))
    }
}

/// Errors emitted by `SubmissionCoordinator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    InFlight,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by attempt sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("attempt has no questions")]
    Empty,
    #[error("could not load attempt: {0}")]
    Fetch(#[source] ApiError),
    #[error("submission failed: {0}")]
    Submission(#[source] ApiError),
    #[error("session expired, sign in again")]
    Auth,
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    #[error(transparent)]
    Attempt(#[from] AttemptError),
}

impl SessionError {
    pub(crate) fn from_fetch(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => SessionError::Auth,
            ApiError::InvalidDefinition(DefinitionError::NoQuestions) => SessionError::Empty,
            other => SessionError::Fetch(other),
        }
    }

    pub(crate) fn from_submit(err: SubmitError) -> Self {
        match err {
            SubmitError::InFlight => SessionError::AlreadySubmitting,
            SubmitError::Api(ApiError::Unauthorized) => SessionError::Auth,
            SubmitError::Api(other) => SessionError::Submission(other),
        }
    }

    /// Worth offering a "try again" button.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Fetch(_) | SessionError::Submission(_))
    }

    /// The caller should send the user to the login screen.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, SessionError::Auth)
    }

    /// Text for an alert or full-screen error state.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionError::Empty => "This exercise has no questions yet.",
            SessionError::Fetch(_) => "We couldn't load this exercise. Check your connection and try again.",
            SessionError::Submission(_) => {
                "Your answers couldn't be submitted. They are kept, so you can try again."
            }
            SessionError::Auth => "Your session has expired. Please sign in again.",
            SessionError::AlreadySubmitting => "Your answers are already being submitted.",
            SessionError::Attempt(AttemptError::Completed) => "This attempt has already been submitted.",
            SessionError::Attempt(AttemptError::TimeUp) => "Time is up. Your answers can't be changed.",
            SessionError::Attempt(_) => "That action isn't available right now.",
        }
    }
}

/// Errors emitted while reading client configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{key} must be a whole number, got {raw:?}")]
    InvalidNumber { key: &'static str, raw: String },
    #[error("passing score must be between 0 and 100, got {0}")]
    PassingScoreOutOfRange(u32),
}

/// Errors emitted by an `AudioPlayer`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlaybackError {
    #[error("section has no audio clip")]
    NoAudio,
    #[error("invalid audio url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("audio backend failed: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_fetch_maps_to_auth() {
        let err = SessionError::from_fetch(ApiError::Unauthorized);
        assert!(err.requires_login());
        assert!(!err.is_retryable());
    }

    #[test]
    fn empty_definition_maps_to_empty() {
        let err = SessionError::from_fetch(ApiError::InvalidDefinition(DefinitionError::NoQuestions));
        assert!(matches!(err, SessionError::Empty));
    }

    #[test]
    fn network_submission_failure_is_retryable() {
        let err = SessionError::from_submit(SubmitError::Api(ApiError::Unavailable("offline".into())));
        assert!(err.is_retryable());
        assert!(err.user_message().contains("try again"));
    }

    #[test]
    fn in_flight_maps_to_already_submitting() {
        let err = SessionError::from_submit(SubmitError::InFlight);
        assert!(matches!(err, SessionError::AlreadySubmitting));
        assert!(!err.is_retryable());
    }
}
