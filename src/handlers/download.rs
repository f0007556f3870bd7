use anyhow::{Context, Result};
use console::{Term, style};
use multfan_dl::config::Config;
use multfan_dl::site;
use multfan_dl::{AcquisitionOptions, DownloadEngine, Orchestrator, Selection};
use std::path::PathBuf;

use super::navigator_from_config;

pub async fn handle_download(
    config: &Config,
    subdomain: String,
    output_dir: Option<PathBuf>,
    seasons: Vec<u32>,
    voices: Vec<u32>,
) -> Result<()> {
    let term = Term::stdout();

    let base_url = site::series_url(&subdomain, &config.site.domain)?;
    let destination = match output_dir.or_else(|| config.general.destination.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let options = AcquisitionOptions::new(&destination)
        .with_seasons(Selection::from_ids(seasons))
        .with_voices(Selection::from_ids(voices));

    term.write_line(&format!(
        "{} Downloading {}",
        style("⬇️").cyan(),
        style(&base_url).cyan().bold()
    ))?;
    term.write_line(&format!(
        "   {}: {}",
        style("Destination").dim(),
        style(destination.display()).cyan()
    ))?;
    term.write_line(&format!("   {}: {}", style("Seasons").dim(), options.seasons))?;
    term.write_line(&format!("   {}: {}", style("Voices").dim(), options.voices))?;
    term.write_line("")?;

    let orchestrator = Orchestrator::new(
        navigator_from_config(config)?,
        DownloadEngine::new(&config.site.user_agent)?,
        config.pacing.clone(),
    );

    let report = orchestrator.run(&base_url, &options).await?;

    term.write_line("")?;
    term.write_line(&format!(
        "{} {} episode(s) in {} season(s): {} saved, {} already present, {} subtitle file(s)",
        style("📦").cyan(),
        report.episodes,
        report.seasons,
        style(report.saved).green(),
        report.skipped,
        report.subtitles
    ))?;

    if report.is_clean() {
        term.write_line(&format!("{} Done", style("✅").green()))?;
        return Ok(());
    }

    term.write_line(&format!(
        "{} {} item(s) failed, run again to retry them:",
        style("⚠️").yellow(),
        report.failures.len()
    ))?;
    for failure in &report.failures {
        let mut item = format!("S{}", failure.season_id);
        if let Some(episode) = &failure.episode_id {
            item.push_str(&format!(" episode {}", episode));
        }
        if let Some(voice) = &failure.voice {
            item.push_str(&format!(" [{}]", voice));
        }
        term.write_line(&format!("   • {}: {}", style(item).red(), failure.reason))?;
    }

    Ok(())
}
