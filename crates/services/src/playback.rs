//! Listening-section audio: which clip is loaded and where playback is.
//!
//! The attempt never owns audio state. The tracker follows the current
//! section and mirrors whatever position the player reports.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use url::Url;

use lingo_core::model::{Section, SectionId};

use crate::config::ClientConfig;
use crate::error::PlaybackError;

/// Last position reported by the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackPosition {
    pub position_ms: u64,
    pub duration_ms: Option<u64>,
    pub playing: bool,
}

impl PlaybackPosition {
    /// Played share of the clip in whole percent, once the duration is known.
    #[must_use]
    pub fn percent(&self) -> Option<u32> {
        let duration = self.duration_ms.filter(|d| *d > 0)?;
        let played = self.position_ms.min(duration);
        u32::try_from(played * 100 / duration).ok()
    }
}

/// Platform audio backend.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Load `url` and start playing from the beginning.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::Backend` if the clip cannot be played.
    async fn play(&self, url: &Url) -> Result<(), PlaybackError>;

    /// # Errors
    ///
    /// Returns `PlaybackError::Backend` on backend failure.
    async fn pause(&self) -> Result<(), PlaybackError>;

    /// # Errors
    ///
    /// Returns `PlaybackError::Backend` on backend failure.
    async fn seek(&self, position_ms: u64) -> Result<(), PlaybackError>;

    fn positions(&self) -> watch::Receiver<PlaybackPosition>;
}

/// What entering a section did to playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionAudio {
    /// Same section as before; the clip keeps playing.
    Unchanged,
    Started(Url),
    /// The section has no clip; anything playing was paused.
    Silent,
}

pub struct PlaybackTracker {
    player: Arc<dyn AudioPlayer>,
    config: ClientConfig,
    positions: watch::Receiver<PlaybackPosition>,
    loaded: Option<SectionId>,
}

impl PlaybackTracker {
    #[must_use]
    pub fn new(player: Arc<dyn AudioPlayer>, config: &ClientConfig) -> Self {
        let positions = player.positions();
        Self {
            player,
            config: config.clone(),
            positions,
            loaded: None,
        }
    }

    /// Section whose clip was last started.
    #[must_use]
    pub fn loaded_section(&self) -> Option<SectionId> {
        self.loaded
    }

    #[must_use]
    pub fn snapshot(&self) -> PlaybackPosition {
        *self.positions.borrow()
    }

    /// Receiver for re-rendering as the player reports progress.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PlaybackPosition> {
        self.positions.clone()
    }

    /// Follow the session's current section, starting its clip on entry.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError::InvalidUrl` for an unresolvable clip reference
    /// and `PlaybackError::Backend` when the player fails.
    pub async fn sync_section(&mut self, section: Option<&Section>) -> Result<SectionAudio, PlaybackError> {
        let Some(section) = section else {
            self.stop().await?;
            return Ok(SectionAudio::Silent);
        };
        if self.loaded == Some(section.id) {
            return Ok(SectionAudio::Unchanged);
        }

        let Some(reference) = section.audio_ref.as_deref() else {
            tracing::debug!(section = %section.id, "section has no audio clip");
            self.stop().await?;
            return Ok(SectionAudio::Silent);
        };

        let url = self.config.media_url(reference)?;
        tracing::debug!(section = %section.id, %url, "starting section audio");
        self.player.play(&url).await?;
        self.loaded = Some(section.id);
        Ok(SectionAudio::Started(url))
    }

    /// # Errors
    ///
    /// Returns `PlaybackError::NoAudio` when nothing is loaded.
    pub async fn pause(&self) -> Result<(), PlaybackError> {
        if self.loaded.is_none() {
            return Err(PlaybackError::NoAudio);
        }
        self.player.pause().await
    }

    /// # Errors
    ///
    /// Returns `PlaybackError::NoAudio` when nothing is loaded.
    pub async fn seek(&self, position_ms: u64) -> Result<(), PlaybackError> {
        if self.loaded.is_none() {
            return Err(PlaybackError::NoAudio);
        }
        self.player.seek(position_ms).await
    }

    async fn stop(&mut self) -> Result<(), PlaybackError> {
        if self.loaded.take().is_some() {
            self.player.pause().await?;
        }
        Ok(())
    }
}
