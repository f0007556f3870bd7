//! Extraction rules applied to a loaded page.
//!
//! Every function here is pure: it takes the page HTML plus the URL it is
//! resolved against and returns owned records. Entries missing a required
//! attribute are dropped, never reported as errors.

use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use super::navigator::PlaybackPage;
use super::{Episode, Season, Voice};

static SEASON_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".numberSeason").expect("valid selector"));
static OTHER_SEASONS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#otherSeasons").expect("valid selector"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("valid selector"));
static EPISODE_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#descrSeason tbody tr td h2 a").expect("valid selector")
});
static VOICE_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#voice h2 a").expect("valid selector"));
static PLAYER_VIDEO: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("pjsdiv video").expect("valid selector"));

// Any absolute https URL ending in .vtt, anywhere in the document.
static SUBTITLE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https://[^\s"']+\.vtt\b"#).expect("valid regex"));

/// Seasons listed on a series index page.
///
/// Main seasons come from `.numberSeason` blocks located before the
/// `#otherSeasons` container; the container's own links follow them.
pub fn seasons(html: &str, base_url: &Url) -> Vec<Season> {
    let document = Html::parse_document(html);
    let other = document.select(&OTHER_SEASONS).next();

    let mut seasons: Vec<Season> = document
        .select(&SEASON_TITLE)
        .filter(|title| match other {
            Some(container) => precedes(&document, *title, container),
            None => true,
        })
        .filter_map(|title| title.select(&ANCHOR).next())
        .filter_map(|link| season_from_link(link, base_url))
        .collect();

    if let Some(container) = other {
        seasons.extend(
            container
                .select(&ANCHOR)
                .filter_map(|link| season_from_link(link, base_url)),
        );
    }

    seasons
}

/// Episodes listed in the `#descrSeason` table of a season page.
pub fn episodes(html: &str, base_url: &Url) -> Vec<Episode> {
    let document = Html::parse_document(html);

    document
        .select(&EPISODE_LINK)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let name = element_text(link);
            if name.is_empty() {
                return None;
            }

            let href = base_url.join(href).ok()?;
            let id = query_param(&href, "id")?;

            Some(Episode { id, name, href })
        })
        .collect()
}

/// Voice tracks offered on an episode page. Links are resolved against the
/// page itself.
pub fn voices(html: &str, page_url: &Url) -> Vec<Voice> {
    let document = Html::parse_document(html);

    document
        .select(&VOICE_LINK)
        .filter_map(|link| {
            let href = page_url.join(link.value().attr("href")?).ok()?;
            let id = query_param(&href, "voice")?;

            Some(Voice {
                id,
                name: element_text(link),
                href,
            })
        })
        .collect()
}

/// Player video source and subtitle track of a playback page.
pub fn playback(html: &str, page_url: &Url) -> PlaybackPage {
    PlaybackPage {
        video_url: video_url(html, page_url),
        subtitle_url: subtitle_url(html),
    }
}

pub fn video_url(html: &str, page_url: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let src = document
        .select(&PLAYER_VIDEO)
        .next()?
        .value()
        .attr("src")?
        .trim();

    if src.is_empty() {
        return None;
    }

    page_url.join(src).ok()
}

pub fn subtitle_url(html: &str) -> Option<Url> {
    SUBTITLE_URL
        .find(html)
        .and_then(|found| Url::parse(found.as_str()).ok())
}

/// Extension of the last path segment, ignoring query and fragment.
pub fn file_extension(url: &Url) -> Option<String> {
    let file_name = url.path_segments()?.last()?;
    let (stem, extension) = file_name.rsplit_once('.')?;

    if stem.is_empty() || extension.is_empty() {
        return None;
    }

    Some(extension.to_string())
}

fn season_from_link(link: ElementRef<'_>, base_url: &Url) -> Option<Season> {
    let href = base_url.join(link.value().attr("href")?).ok()?;
    let id = query_param(&href, "id")?;

    Some(Season { id, href })
}

fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// True when `node` comes before `other` in document order. An ancestor of
/// `other` counts as preceding it; a descendant does not.
fn precedes(document: &Html, node: ElementRef<'_>, other: ElementRef<'_>) -> bool {
    for current in document.tree.root().descendants() {
        if current.id() == node.id() {
            return true;
        }
        if current.id() == other.id() {
            return false;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://smeshariki.mult-fan.tv/").unwrap()
    }

    #[test]
    fn test_seasons_main_then_other() {
        let html = r#"
            <html><body>
              <div class="numberSeason"><a href="season.php?id=1">Season 1</a></div>
              <div class="numberSeason"><a href="season.php?id=2">Season 2</a></div>
              <div id="otherSeasons">
                <a href="season.php?id=10">Specials</a>
                <a href="season.php">Broken</a>
                <div class="numberSeason"><a href="season.php?id=11">Nested</a></div>
              </div>
              <div class="numberSeason"><a href="season.php?id=3">After</a></div>
            </body></html>
        "#;

        let seasons = seasons(html, &base());
        let ids: Vec<&str> = seasons.iter().map(|s| s.id.as_str()).collect();

        // Nested and trailing titles are only reachable through the container.
        assert_eq!(ids, vec!["1", "2", "10", "11"]);
        assert_eq!(
            seasons[0].href.as_str(),
            "https://smeshariki.mult-fan.tv/season.php?id=1"
        );
    }

    #[test]
    fn test_seasons_without_other_container() {
        let html = r#"
            <div class="numberSeason"><a href="/season.php?id=1">1</a></div>
            <div class="numberSeason"><span>no link</span></div>
            <div class="numberSeason"><a href="/season.php?id=">empty</a></div>
            <div class="numberSeason"><a href="/season.php?id=4">4</a></div>
        "#;

        let ids: Vec<String> = seasons(html, &base()).into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn test_episodes() {
        let html = r#"
            <table id="descrSeason">
              <tr><td><h2><a href="/episode.php?id=101"> Pilot </a></h2></td></tr>
              <tr><td><h2><a href="/episode.php?id=102"></a></h2></td></tr>
              <tr><td><h2><a>No href</a></h2></td></tr>
              <tr><td><h2><a href="/episode.php?page=2">No id</a></h2></td></tr>
              <tr><td><h2><a href="/episode.php?id=103">The <b>Second</b> One</a></h2></td></tr>
            </table>
            <h2><a href="/episode.php?id=999">Outside table</a></h2>
        "#;

        let episodes = episodes(html, &base());
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].id, "101");
        assert_eq!(episodes[0].name, "Pilot");
        assert_eq!(
            episodes[0].href.as_str(),
            "https://smeshariki.mult-fan.tv/episode.php?id=101"
        );
        assert_eq!(episodes[1].id, "103");
        assert_eq!(episodes[1].name, "The Second One");
    }

    #[test]
    fn test_voices() {
        let page = Url::parse("https://smeshariki.mult-fan.tv/episode.php?id=101").unwrap();
        let html = r#"
            <div id="voice">
              <h2><a href="watch.php?id=101&amp;voice=1">English</a></h2>
              <h2><a href="watch.php?id=101">Default</a></h2>
              <h2><a href="https://cdn.example.com/w?voice=7"> Original </a></h2>
            </div>
        "#;

        let voices = voices(html, &page);
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].id, "1");
        assert_eq!(voices[0].name, "English");
        assert_eq!(
            voices[0].href.as_str(),
            "https://smeshariki.mult-fan.tv/watch.php?id=101&voice=1"
        );
        assert_eq!(voices[1].id, "7");
        assert_eq!(voices[1].name, "Original");
    }

    #[test]
    fn test_playback_page() {
        let page = Url::parse("https://smeshariki.mult-fan.tv/watch.php?id=1&voice=2").unwrap();
        let html = r#"
            <pjsdiv><video src="/media/1-2.mp4"></video></pjsdiv>
            <script>var player = {"subtitle":"https://subs.example.com/ru/1.vtt?x=1"};</script>
        "#;

        let playback = playback(html, &page);
        assert_eq!(
            playback.video_url.unwrap().as_str(),
            "https://smeshariki.mult-fan.tv/media/1-2.mp4"
        );
        assert_eq!(
            playback.subtitle_url.unwrap().as_str(),
            "https://subs.example.com/ru/1.vtt"
        );
    }

    #[test]
    fn test_playback_page_without_player() {
        let page = base();
        let html = r#"<video src="/media/outside.mp4"></video><pjsdiv><video></video></pjsdiv>"#;

        let playback = playback(html, &page);
        assert!(playback.video_url.is_none());
        assert!(playback.subtitle_url.is_none());
    }

    #[test]
    fn test_subtitle_requires_https() {
        assert!(subtitle_url(r#"<a href="http://example.com/a.vtt">x</a>"#).is_none());
        assert!(subtitle_url(r#"<a href="https://example.com/a.vttx">x</a>"#).is_none());
        assert!(subtitle_url(r#"'https://example.com/a.vtt'"#).is_some());
    }

    #[test]
    fn test_file_extension() {
        let ext = |s: &str| file_extension(&Url::parse(s).unwrap());

        assert_eq!(ext("https://cdn.example.com/v/1.mp4").as_deref(), Some("mp4"));
        assert_eq!(
            ext("https://cdn.example.com/v/1.m3u8?token=a.b").as_deref(),
            Some("m3u8")
        );
        assert_eq!(ext("https://cdn.example.com/v/subs.ru.vtt").as_deref(), Some("vtt"));
        assert_eq!(ext("https://cdn.example.com/v/stream"), None);
        assert_eq!(ext("https://cdn.example.com/v/"), None);
        assert_eq!(ext("https://cdn.example.com/v/.hidden"), None);
    }
}
