pub mod extract;
pub mod navigator;
pub mod page;

pub use navigator::{EpisodePage, PlaybackPage, SiteNavigator};
pub use page::{HeadlessPageSource, HttpPageSource, LoadedPage, PageSource};

use anyhow::{Context, Result};
use reqwest::Url;
use std::fmt;

/// Domain every series lives under, one subdomain per series.
pub const DEFAULT_DOMAIN: &str = "mult-fan.tv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Season {
    pub id: String,
    pub href: Url,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    pub id: String,
    /// Link text from the season page, used verbatim in file names.
    pub name: String,
    pub href: Url,
}

/// An audio/dub track of an episode with its own playback page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub href: Url,
}

/// Build `https://{subdomain}.{domain}/`
pub fn series_url(subdomain: &str, domain: &str) -> Result<Url> {
    let subdomain = subdomain.trim().trim_end_matches('.');
    anyhow::ensure!(!subdomain.is_empty(), "Series subdomain cannot be empty");

    Url::parse(&format!("https://{}.{}/", subdomain, domain))
        .with_context(|| format!("Invalid series address for subdomain '{}'", subdomain))
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{} ({})", self.id, self.href)
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.id)
    }
}
