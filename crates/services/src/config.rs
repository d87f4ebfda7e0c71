use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const BASE_URL_VAR: &str = "LINGO_API_BASE_URL";
pub const PASSING_SCORE_VAR: &str = "LINGO_PASSING_SCORE";
pub const TIMEOUT_VAR: &str = "LINGO_HTTP_TIMEOUT_SECS";

pub const DEFAULT_PASSING_SCORE: u32 = 60;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the judge lives and how results are interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: Url,
    pub passing_threshold: u32,
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base(base_url)?,
            passing_threshold: DEFAULT_PASSING_SCORE,
            request_timeout: DEFAULT_TIMEOUT,
        })
    }

    /// # Errors
    ///
    /// Returns `ConfigError::PassingScoreOutOfRange` above 100.
    pub fn with_passing_threshold(mut self, threshold: u32) -> Result<Self, ConfigError> {
        if threshold > 100 {
            return Err(ConfigError::PassingScoreOutOfRange(threshold));
        }
        self.passing_threshold = threshold;
        Ok(self)
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read `LINGO_API_BASE_URL`, `LINGO_PASSING_SCORE` and `LINGO_HTTP_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the base url is missing or a value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = lookup(BASE_URL_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing(BASE_URL_VAR))?;
        let mut config = Self::new(base_url.trim())?;

        if let Some(raw) = lookup(PASSING_SCORE_VAR) {
            let threshold = parse_number(PASSING_SCORE_VAR, &raw)?;
            config = config.with_passing_threshold(threshold)?;
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs = parse_number(TIMEOUT_VAR, &raw)?;
            config = config.with_request_timeout(Duration::from_secs(u64::from(secs)));
        }
        Ok(config)
    }

    /// Resolve a media reference (absolute or relative to the API root).
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the reference cannot be joined.
    pub fn media_url(&self, reference: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(reference)
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn normalize_base(raw: &str) -> Result<Url, url::ParseError> {
    if raw.ends_with('/') {
        Url::parse(raw)
    } else {
        Url::parse(&format!("{raw}/"))
    }
}

fn parse_number(key: &'static str, raw: &str) -> Result<u32, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let config = ClientConfig::new("https://api.example.com/v1").unwrap();
        assert_eq!(config.base_url.as_str(), "https://api.example.com/v1/");
        assert_eq!(
            config.base_url.join("tests/3").unwrap().as_str(),
            "https://api.example.com/v1/tests/3"
        );
    }

    #[test]
    fn reads_all_values_from_lookup() {
        let config = ClientConfig::from_lookup(lookup(&[
            (BASE_URL_VAR, "http://localhost:8000/api"),
            (PASSING_SCORE_VAR, "75"),
            (TIMEOUT_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(config.passing_threshold, 75);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn missing_base_url_is_an_error() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(BASE_URL_VAR)));
    }

    #[test]
    fn bad_passing_score_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[
            (BASE_URL_VAR, "http://localhost"),
            (PASSING_SCORE_VAR, "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));

        let err = ClientConfig::new("http://localhost")
            .unwrap()
            .with_passing_threshold(101)
            .unwrap_err();
        assert!(matches!(err, ConfigError::PassingScoreOutOfRange(101)));
    }

    #[test]
    fn media_refs_resolve_against_api_root() {
        let config = ClientConfig::new("https://api.example.com/v1/").unwrap();
        assert_eq!(
            config.media_url("media/clip.mp3").unwrap().as_str(),
            "https://api.example.com/v1/media/clip.mp3"
        );
        assert_eq!(
            config.media_url("https://cdn.example.com/a.mp3").unwrap().as_str(),
            "https://cdn.example.com/a.mp3"
        );
    }
}
