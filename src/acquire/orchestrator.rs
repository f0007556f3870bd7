use reqwest::Url;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use super::{AcquireError, AcquisitionReport, EpisodeError, Selection};
use crate::config::PacingConfig;
use crate::download::{DownloadProgress, ProgressTracker, Transfer};
use crate::layout::{self, AcquisitionTarget};
use crate::pacer;
use crate::site::{Episode, Season, SiteNavigator, Voice, extract};

#[derive(Debug, Clone)]
pub struct AcquisitionOptions {
    pub destination: PathBuf,
    pub seasons: Selection,
    pub voices: Selection,
}

impl AcquisitionOptions {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            seasons: Selection::All,
            voices: Selection::All,
        }
    }

    pub fn with_seasons(mut self, seasons: Selection) -> Self {
        self.seasons = seasons;
        self
    }

    pub fn with_voices(mut self, voices: Selection) -> Self {
        self.voices = voices;
        self
    }
}

/// Bookkeeping for one run
#[derive(Debug, Default)]
struct RunState {
    report: AcquisitionReport,
    /// Voice ids offered by any loaded episode page
    offered_voices: BTreeSet<String>,
    selected_voices: usize,
    /// Voice pages and media requested so far
    requests: usize,
}

/// Sequential crawl of one series.
///
/// Seasons, episodes and voices are visited in page order, one request at a
/// time. Anything that goes wrong inside an episode is logged, recorded in
/// the report and skipped. The run only fails as a whole when the series
/// has no seasons or a season or voice selection matches nothing.
#[derive(Debug)]
pub struct Orchestrator {
    navigator: SiteNavigator,
    downloader: Box<dyn Transfer>,
    pacing: PacingConfig,
}

impl Orchestrator {
    pub fn new(
        navigator: SiteNavigator,
        downloader: impl Transfer + 'static,
        pacing: PacingConfig,
    ) -> Self {
        Self {
            navigator,
            downloader: Box::new(downloader),
            pacing,
        }
    }

    pub async fn run(
        &self,
        base_url: &Url,
        options: &AcquisitionOptions,
    ) -> Result<AcquisitionReport, AcquireError> {
        let seasons = self
            .navigator
            .list_seasons(base_url)
            .await
            .map_err(AcquireError::Navigation)?;

        if seasons.is_empty() {
            return Err(AcquireError::NoSeasons(base_url.clone()));
        }

        let available: Vec<&str> = seasons.iter().map(|s| s.id.as_str()).collect();
        let available = available.join(", ");
        let seasons: Vec<Season> = seasons
            .into_iter()
            .filter(|season| options.seasons.includes(&season.id))
            .collect();

        if seasons.is_empty() {
            return Err(AcquireError::SeasonFilterMismatch {
                selection: options.seasons.clone(),
                available,
            });
        }

        info!(count = seasons.len(), "Seasons to load");

        let mut state = RunState::default();
        state.report.seasons = seasons.len();

        for season in &seasons {
            let episodes = match self.navigator.list_episodes(&season.href, base_url).await {
                Ok(episodes) => episodes,
                Err(e) => {
                    error!(season = %season.id, "Failed to list episodes: {:#}", e);
                    state
                        .report
                        .record_failure(season, None, None, format!("{:#}", e));
                    continue;
                }
            };

            info!(
                season = %season.id,
                count = episodes.len(),
                "Loading episodes"
            );

            for episode in &episodes {
                state.report.episodes += 1;
                info!(season = %season.id, episode = %episode.id, "Loading episode");

                let requests_before = state.requests;
                match self
                    .acquire_episode(season, episode, options, &mut state)
                    .await
                {
                    Ok(()) => {
                        info!(season = %season.id, episode = %episode.id, "Episode processed");
                    }
                    Err(e) => {
                        error!(
                            season = %season.id,
                            episode = %episode.id,
                            "Failed to load episode: {}",
                            e
                        );
                        state.report.record_failure(season, Some(episode), None, &e);
                    }
                }

                // Only the episode page was loaded, no need to cool down.
                if state.requests > requests_before {
                    self.episode_cooldown().await;
                }
            }
        }

        if matches!(options.voices, Selection::Subset(_))
            && !state.offered_voices.is_empty()
            && state.selected_voices == 0
        {
            let available: Vec<&str> = state.offered_voices.iter().map(String::as_str).collect();
            return Err(AcquireError::VoiceFilterMismatch {
                selection: options.voices.clone(),
                available: available.join(", "),
            });
        }

        let report = state.report;

        info!(
            saved = report.saved,
            skipped = report.skipped,
            subtitles = report.subtitles,
            failed = report.failures.len(),
            "Run finished"
        );

        Ok(report)
    }

    async fn acquire_episode(
        &self,
        season: &Season,
        episode: &Episode,
        options: &AcquisitionOptions,
        state: &mut RunState,
    ) -> Result<(), EpisodeError> {
        let page = self
            .navigator
            .list_voices(&episode.href)
            .await
            .map_err(EpisodeError::Navigation)?;

        let names: Vec<&str> = page.voices.iter().map(|v| v.name.as_str()).collect();
        info!(
            season = %season.id,
            episode = %episode.id,
            "Available voices: {}",
            names.join(", ")
        );

        let voices: Vec<&Voice> = page
            .voices
            .iter()
            .filter(|voice| options.voices.includes(&voice.id))
            .collect();

        state
            .offered_voices
            .extend(page.voices.iter().map(|v| v.id.clone()));
        state.selected_voices += voices.len();

        if voices.is_empty() && !page.voices.is_empty() {
            warn!(
                season = %season.id,
                episode = %episode.id,
                "No voices match selection {}",
                options.voices
            );
        }

        let video_url = page
            .playback
            .video_url
            .as_ref()
            .ok_or_else(|| EpisodeError::MissingVideo(episode.href.clone()))?;
        let extension = extract::file_extension(video_url)
            .ok_or_else(|| EpisodeError::MissingExtension(video_url.clone()))?;

        for voice in voices {
            let path = AcquisitionTarget::new(season, episode, voice, Some(extension.as_str()))
                .path(&options.destination);

            if layout::exists(&path).await {
                info!(
                    season = %season.id,
                    episode = %episode.id,
                    voice = %voice.name,
                    path = %path.display(),
                    "Already exists"
                );
                state.report.skipped += 1;
                continue;
            }

            match self
                .acquire_voice(season, episode, voice, options, state)
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_extraction_gap() => {
                    error!(
                        season = %season.id,
                        episode = %episode.id,
                        voice = %voice.name,
                        "Skipping voice: {}",
                        e
                    );
                    state
                        .report
                        .record_failure(season, Some(episode), Some(voice), &e);
                }
                Err(e) => return Err(e),
            }

            info!(
                secs = self.pacing.voice_cooldown_secs,
                "Waiting before next voice"
            );
            pacer::pause(self.pacing.voice_cooldown_secs).await;
        }

        Ok(())
    }

    async fn acquire_voice(
        &self,
        season: &Season,
        episode: &Episode,
        voice: &Voice,
        options: &AcquisitionOptions,
        state: &mut RunState,
    ) -> Result<(), EpisodeError> {
        state.requests += 1;
        let playback = self
            .navigator
            .inspect_voice(voice)
            .await
            .map_err(EpisodeError::Navigation)?;

        let video_url = playback
            .video_url
            .ok_or_else(|| EpisodeError::MissingVideo(voice.href.clone()))?;
        let extension = extract::file_extension(&video_url)
            .ok_or_else(|| EpisodeError::MissingExtension(video_url.clone()))?;

        let path = AcquisitionTarget::new(season, episode, voice, Some(extension.as_str()))
            .path(&options.destination);

        state.requests += 1;
        self.downloader
            .fetch(
                &video_url,
                &path,
                &mut progress_logger("episode", 5, season, episode, voice),
            )
            .await?;
        state.report.saved += 1;

        info!(
            season = %season.id,
            episode = %episode.id,
            voice = %voice.name,
            path = %path.display(),
            "Episode saved"
        );

        let Some(subtitle_url) = playback.subtitle_url else {
            return Ok(());
        };

        let Some(subtitle_extension) = extract::file_extension(&subtitle_url) else {
            error!(
                season = %season.id,
                episode = %episode.id,
                voice = %voice.name,
                url = %subtitle_url,
                "Failed to get subtitles file extension"
            );
            return Ok(());
        };

        let subtitle_path =
            AcquisitionTarget::new(season, episode, voice, Some(subtitle_extension.as_str()))
                .path(&options.destination);

        if layout::exists(&subtitle_path).await {
            return Ok(());
        }

        info!(
            season = %season.id,
            episode = %episode.id,
            voice = %voice.name,
            "Downloading subtitles"
        );

        state.requests += 1;
        self.downloader
            .fetch(
                &subtitle_url,
                &subtitle_path,
                &mut progress_logger("subtitles", 10, season, episode, voice),
            )
            .await?;
        state.report.subtitles += 1;

        info!(
            season = %season.id,
            episode = %episode.id,
            voice = %voice.name,
            path = %subtitle_path.display(),
            "Subtitles saved"
        );

        Ok(())
    }

    async fn episode_cooldown(&self) {
        let secs = pacer::random_delay(
            self.pacing.episode_cooldown_min_secs,
            self.pacing.episode_cooldown_max_secs,
        );

        info!(
            "Waiting time before next episode: {}",
            ProgressTracker::format_duration(Duration::from_secs(secs))
        );
        pacer::pause(secs).await;
    }
}

/// Log every `step` percent of a transfer
fn progress_logger<'a>(
    asset: &'static str,
    step: u8,
    season: &'a Season,
    episode: &'a Episode,
    voice: &'a Voice,
) -> impl FnMut(DownloadProgress) + Send + 'a {
    move |progress| {
        if progress.percentage % step == 0 {
            info!(
                season = %season.id,
                episode = %episode.id,
                voice = %voice.name,
                "Downloading {}: {}% {} / {}",
                asset,
                progress.percentage,
                ProgressTracker::format_bytes(progress.downloaded_bytes),
                ProgressTracker::format_bytes(progress.total_bytes)
            );
        }
    }
}
