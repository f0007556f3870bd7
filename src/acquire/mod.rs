pub mod orchestrator;
pub mod selection;

pub use orchestrator::{AcquisitionOptions, Orchestrator};
pub use selection::Selection;

use reqwest::Url;
use thiserror::Error;

use crate::download::DownloadError;
use crate::site::{Episode, Season, Voice};

/// Errors that stop the whole run
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("failed to list seasons: {0:#}")]
    Navigation(anyhow::Error),

    #[error("no seasons found at {0}")]
    NoSeasons(Url),

    #[error("season selection {selection} matched none of the discovered seasons ({available})")]
    SeasonFilterMismatch {
        selection: Selection,
        available: String,
    },

    #[error("voice selection {selection} matched none of the offered voices ({available})")]
    VoiceFilterMismatch {
        selection: Selection,
        available: String,
    },
}

/// Errors confined to one episode or voice; the run carries on after them
#[derive(Debug, Error)]
pub enum EpisodeError {
    #[error("failed to load page: {0:#}")]
    Navigation(anyhow::Error),

    #[error("no video source found on {0}")]
    MissingVideo(Url),

    #[error("cannot infer a file extension from {0}")]
    MissingExtension(Url),

    #[error(transparent)]
    Download(#[from] DownloadError),
}

impl EpisodeError {
    /// The page rendered without something we need. Only the current voice
    /// is skipped for these.
    pub fn is_extraction_gap(&self) -> bool {
        matches!(
            self,
            EpisodeError::MissingVideo(_) | EpisodeError::MissingExtension(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub season_id: String,
    pub episode_id: Option<String>,
    pub voice: Option<String>,
    pub reason: String,
}

/// What a run did, item by item counts plus every failure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquisitionReport {
    pub seasons: usize,
    pub episodes: usize,
    pub saved: usize,
    pub skipped: usize,
    pub subtitles: usize,
    pub failures: Vec<FailedItem>,
}

impl AcquisitionReport {
    pub(crate) fn record_failure(
        &mut self,
        season: &Season,
        episode: Option<&Episode>,
        voice: Option<&Voice>,
        reason: impl ToString,
    ) {
        self.failures.push(FailedItem {
            season_id: season.id.clone(),
            episode_id: episode.map(|e| e.id.clone()),
            voice: voice.map(|v| v.name.clone()),
            reason: reason.to_string(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
