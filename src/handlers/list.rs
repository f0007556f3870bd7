use anyhow::{Result, bail};
use multfan_dl::config::Config;
use multfan_dl::{Selection, site};

use super::navigator_from_config;

pub async fn handle_list(config: &Config, subdomain: String, season: Option<u32>) -> Result<()> {
    let base_url = site::series_url(&subdomain, &config.site.domain)?;
    let navigator = navigator_from_config(config)?;

    let seasons = navigator.list_seasons(&base_url).await?;
    if seasons.is_empty() {
        bail!("No seasons found at {}", base_url);
    }

    let Some(number) = season else {
        println!("📺 Seasons of {}:", base_url);
        for season in &seasons {
            println!("   • S{}  {}", season.id, season.href);
        }
        return Ok(());
    };

    let selection = Selection::from_ids([number]);
    let Some(season) = seasons.iter().find(|s| selection.includes(&s.id)) else {
        let ids: Vec<&str> = seasons.iter().map(|s| s.id.as_str()).collect();
        bail!(
            "Season {} not found, available seasons: {}",
            number,
            ids.join(", ")
        );
    };

    let episodes = navigator.list_episodes(&season.href, &base_url).await?;

    println!("📺 Season {} ({} episodes):", season.id, episodes.len());
    for episode in &episodes {
        println!("   • [{}] {}", episode.id, episode.name);
    }

    Ok(())
}
