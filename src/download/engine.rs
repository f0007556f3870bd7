use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Response, Url};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use super::{DownloadError, DownloadProgress, ProgressTracker, Transfer};

/// Streams a single URL to disk.
///
/// Bytes land in a `<name>.part` sibling and are renamed over the
/// destination only once the body has been fully written, so the destination
/// either holds the complete file or does not exist.
#[derive(Debug, Clone)]
pub struct DownloadEngine {
    client: Client,
}

impl DownloadEngine {
    pub fn new(user_agent: &str) -> Result<Self> {
        // Only a connect timeout; a full episode can take arbitrarily long.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    pub async fn download(&self, url: &Url, destination: &Path) -> Result<u64, DownloadError> {
        self.download_with_progress(url, destination, |_| {}).await
    }

    /// Download `url` into `destination`, returning the number of bytes written
    pub async fn download_with_progress<F>(
        &self,
        url: &Url,
        destination: &Path,
        mut on_progress: F,
    ) -> Result<u64, DownloadError>
    where
        F: FnMut(DownloadProgress),
    {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(DownloadError::filesystem(parent))?;
        }

        let part_path = part_path(destination);
        let written = match stream_to_file(response, &part_path, &mut on_progress).await {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&part_path).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&part_path, destination).await {
            let _ = fs::remove_file(&part_path).await;
            return Err(DownloadError::filesystem(destination)(e));
        }

        Ok(written)
    }
}

#[async_trait]
impl Transfer for DownloadEngine {
    async fn fetch(
        &self,
        url: &Url,
        destination: &Path,
        on_progress: &mut (dyn FnMut(DownloadProgress) + Send),
    ) -> Result<u64, DownloadError> {
        self.download_with_progress(url, destination, on_progress).await
    }
}

async fn stream_to_file<F>(
    response: Response,
    path: &Path,
    on_progress: &mut F,
) -> Result<u64, DownloadError>
where
    F: FnMut(DownloadProgress),
{
    let mut tracker = ProgressTracker::new(response.content_length().unwrap_or(0));
    let mut file = File::create(path)
        .await
        .map_err(DownloadError::filesystem(path))?;

    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;

        file.write_all(&chunk)
            .await
            .map_err(DownloadError::filesystem(path))?;

        if let Some(progress) = tracker.advance(chunk.len() as u64) {
            on_progress(progress);
        }
    }

    file.flush().await.map_err(DownloadError::filesystem(path))?;
    file.sync_all()
        .await
        .map_err(DownloadError::filesystem(path))?;

    Ok(tracker.downloaded_bytes())
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}
