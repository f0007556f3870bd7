pub mod engine;
pub mod progress;

pub use engine::DownloadEngine;
pub use progress::{DownloadProgress, ProgressTracker};

use async_trait::async_trait;
use reqwest::Url;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Moves one remote file to a local path, reporting progress on the way
#[async_trait]
pub trait Transfer: Send + Sync + std::fmt::Debug {
    async fn fetch(
        &self,
        url: &Url,
        destination: &Path,
        on_progress: &mut (dyn FnMut(DownloadProgress) + Send),
    ) -> Result<u64, DownloadError>;
}

#[derive(Debug, Error)]
pub enum DownloadError {
    /// The server answered with a non-2xx status
    #[error("failed to download file: {status} {status_text}")]
    Status { status: u16, status_text: String },

    #[error("transfer failed: {0}")]
    Transfer(#[from] reqwest::Error),

    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| DownloadError::Filesystem { path, source }
    }
}
