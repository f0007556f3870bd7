use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multfan-dl")]
#[command(about = "Download whole series from mult-fan.tv, season by season and voice by voice")]
#[command(long_about = "
multfan-dl walks a series on mult-fan.tv (seasons, episodes, voice tracks)
and downloads every episode video plus its subtitles when the player offers
them. Files that already exist are skipped, so an interrupted run can simply
be started again.

Files are laid out as {output}/S{season}/{voice}/{NN}_{episode}.{ext}

Examples:
  multfan-dl download smeshariki -o ~/Videos/Smeshariki
  multfan-dl download smeshariki -s 1 -s 2 --voice 3
  multfan-dl list smeshariki              # seasons of a series
  multfan-dl list smeshariki --season 2   # episodes of season 2
")]
#[command(version)]
pub struct Cli {
    /// Override config file path
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a series
    #[command(visible_alias = "dl")]
    Download {
        /// Series subdomain (e.g. "smeshariki" for smeshariki.mult-fan.tv)
        subdomain: String,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        #[arg(help = "Output directory (defaults to general.destination, then the current directory)")]
        output_dir: Option<PathBuf>,

        /// Seasons to download
        #[arg(short, long = "season", value_name = "N")]
        #[arg(help = "Season number to download, repeatable (defaults to all seasons)")]
        seasons: Vec<u32>,

        /// Voice tracks to download
        #[arg(short = 'V', long = "voice", value_name = "ID")]
        #[arg(help = "Voice id to download, repeatable (defaults to all voices)")]
        voices: Vec<u32>,
    },

    /// List seasons of a series, or episodes of one season
    #[command(visible_alias = "ls")]
    List {
        /// Series subdomain
        subdomain: String,

        /// Show the episodes of this season instead
        #[arg(short, long, value_name = "N")]
        season: Option<u32>,
    },

    /// Manage configuration
    #[command(visible_alias = "cfg")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ConfigFormat,
    },

    /// Print the config file location
    Path,

    /// Validate configuration
    #[command(visible_alias = "check")]
    Validate,

    /// Create sample configuration next to the config file
    Sample {
        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum ConfigFormat {
    /// TOML format (default)
    Toml,
    /// JSON format
    Json,
}

impl std::fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigFormat::Toml => write!(f, "toml"),
            ConfigFormat::Json => write!(f, "json"),
        }
    }
}

impl Cli {
    /// Validate CLI arguments and show helpful error messages
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Commands::Download { subdomain, .. } | Commands::List { subdomain, .. } => {
                if subdomain.trim().is_empty() {
                    return Err("Series subdomain cannot be empty".to_string());
                }
                if subdomain.contains('/') || subdomain.contains(':') {
                    return Err(format!(
                        "Expected a bare subdomain like 'smeshariki', got '{}'",
                        subdomain
                    ));
                }
            }
            Commands::Config { .. } => {}
        }
        Ok(())
    }

    /// Check if config validation should be skipped for this command
    pub fn skips_config_validation(&self) -> bool {
        matches!(
            self.command,
            Commands::Config {
                action: ConfigAction::Validate | ConfigAction::Path | ConfigAction::Sample { .. }
            }
        )
    }
}
