//! On-disk layout of downloaded episodes.
//!
//! `{destination}/S{season}/{voice}/{NN}_{episode name}.{ext}`. Presence of a
//! file at its resolved path is the only record that it was downloaded.

use std::path::{Path, PathBuf};

use crate::site::{Episode, Season, Voice};

/// One file to fetch: a voice track of an episode, with the extension of the
/// asset (video or subtitles).
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionTarget<'a> {
    pub season: &'a Season,
    pub episode: &'a Episode,
    pub voice: &'a Voice,
    pub extension: Option<&'a str>,
}

impl<'a> AcquisitionTarget<'a> {
    pub fn new(
        season: &'a Season,
        episode: &'a Episode,
        voice: &'a Voice,
        extension: Option<&'a str>,
    ) -> Self {
        Self {
            season,
            episode,
            voice,
            extension,
        }
    }

    pub fn path(&self, destination: &Path) -> PathBuf {
        resolve(
            destination,
            self.season,
            self.episode,
            self.voice,
            self.extension,
        )
    }
}

/// Two-digit episode number: the id padded to four digits, last two kept.
/// Ids past 99 wrap on purpose ("123" gives "23").
pub fn episode_ordinal(episode_id: &str) -> String {
    let padded: Vec<char> = format!("{:0>4}", episode_id).chars().collect();
    padded[padded.len() - 2..].iter().collect()
}

pub fn file_name(episode: &Episode, extension: Option<&str>) -> String {
    let ordinal = episode_ordinal(&episode.id);

    match extension {
        Some(ext) => format!("{}_{}.{}", ordinal, episode.name, ext),
        None => format!("{}_{}", ordinal, episode.name),
    }
}

/// Names are used as-is, without sanitizing.
pub fn resolve(
    destination: &Path,
    season: &Season,
    episode: &Episode,
    voice: &Voice,
    extension: Option<&str>,
) -> PathBuf {
    destination
        .join(format!("S{}", season.id))
        .join(&voice.name)
        .join(file_name(episode, extension))
}

/// Whether something is already at `path`. Errors count as absent.
pub async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
