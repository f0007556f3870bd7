use anyhow::Result;
use reqwest::Url;
use tracing::debug;

use super::extract;
use super::{Episode, PageSource, Season, Voice};

/// Media discovered on a playback page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackPage {
    /// `src` of the player's video element
    pub video_url: Option<Url>,
    /// First `.vtt` link found anywhere in the document. This is a plain
    /// pattern match and may pick up unrelated subtitle links.
    pub subtitle_url: Option<Url>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodePage {
    pub voices: Vec<Voice>,
    pub playback: PlaybackPage,
}

/// Walks the series → season → episode hierarchy. Each call loads exactly
/// one page and drops it before returning.
#[derive(Debug)]
pub struct SiteNavigator {
    pages: Box<dyn PageSource>,
}

impl SiteNavigator {
    pub fn new(pages: Box<dyn PageSource>) -> Self {
        Self { pages }
    }

    pub async fn list_seasons(&self, base_url: &Url) -> Result<Vec<Season>> {
        let page = self.pages.load(base_url).await?;
        let seasons = extract::seasons(&page.html, base_url);

        debug!(url = %base_url, count = seasons.len(), "Extracted seasons");
        Ok(seasons)
    }

    pub async fn list_episodes(&self, season_url: &Url, base_url: &Url) -> Result<Vec<Episode>> {
        let page = self.pages.load(season_url).await?;
        let episodes = extract::episodes(&page.html, base_url);

        debug!(url = %season_url, count = episodes.len(), "Extracted episodes");
        Ok(episodes)
    }

    /// Voice tracks of an episode together with the episode's default player
    pub async fn list_voices(&self, episode_url: &Url) -> Result<EpisodePage> {
        let page = self.pages.load(episode_url).await?;
        let voices = extract::voices(&page.html, &page.url);
        let playback = extract::playback(&page.html, &page.url);

        debug!(
            url = %episode_url,
            count = voices.len(),
            video = playback.video_url.is_some(),
            subtitles = playback.subtitle_url.is_some(),
            "Extracted voices"
        );
        Ok(EpisodePage { voices, playback })
    }

    /// Player contents of a voice's own playback page
    pub async fn inspect_voice(&self, voice: &Voice) -> Result<PlaybackPage> {
        let page = self.pages.load(&voice.href).await?;
        Ok(extract::playback(&page.html, &page.url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::LoadedPage;
    use async_trait::async_trait;
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    struct StaticPages {
        pages: HashMap<String, String>,
    }

    impl StaticPages {
        fn with(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }
    }

    #[async_trait]
    impl PageSource for StaticPages {
        async fn load(&self, url: &Url) -> Result<LoadedPage> {
            let html = self
                .pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no page for {}", url))?;
            Ok(LoadedPage {
                url: url.clone(),
                html,
            })
        }
    }

    #[tokio::test]
    async fn test_navigates_hierarchy() {
        let base = Url::parse("https://fixiki.mult-fan.tv/").unwrap();
        let pages = StaticPages::default()
            .with(
                "https://fixiki.mult-fan.tv/",
                r#"<div class="numberSeason"><a href="season.php?id=2">2</a></div>"#,
            )
            .with(
                "https://fixiki.mult-fan.tv/season.php?id=2",
                r#"<table id="descrSeason"><tr><td><h2><a href="episode.php?id=5">Five</a></h2></td></tr></table>"#,
            )
            .with(
                "https://fixiki.mult-fan.tv/episode.php?id=5",
                r#"<div id="voice"><h2><a href="watch.php?id=5&amp;voice=3">RU</a></h2></div>
                   <pjsdiv><video src="https://cdn.example.com/5.mp4"></video></pjsdiv>"#,
            )
            .with(
                "https://fixiki.mult-fan.tv/watch.php?id=5&voice=3",
                r#"<pjsdiv><video src="https://cdn.example.com/5-3.mp4"></video></pjsdiv>"#,
            );
        let navigator = SiteNavigator::new(Box::new(pages));

        let seasons = navigator.list_seasons(&base).await.unwrap();
        assert_eq!(seasons.len(), 1);

        let episodes = navigator.list_episodes(&seasons[0].href, &base).await.unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].name, "Five");

        let episode_page = navigator.list_voices(&episodes[0].href).await.unwrap();
        assert_eq!(episode_page.voices.len(), 1);
        assert_eq!(
            episode_page.playback.video_url.unwrap().as_str(),
            "https://cdn.example.com/5.mp4"
        );

        let playback = navigator
            .inspect_voice(&episode_page.voices[0])
            .await
            .unwrap();
        assert_eq!(
            playback.video_url.unwrap().as_str(),
            "https://cdn.example.com/5-3.mp4"
        );
        assert!(playback.subtitle_url.is_none());
    }

    #[tokio::test]
    async fn test_load_failure_propagates() {
        let navigator = SiteNavigator::new(Box::new(StaticPages::default()));
        let base = Url::parse("https://fixiki.mult-fan.tv/").unwrap();

        assert!(navigator.list_seasons(&base).await.is_err());
    }
}
