use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::site::DEFAULT_DOMAIN;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub pages: PagesConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output root used when `--output` is not given
    #[serde(default)]
    pub destination: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageBackend {
    /// Plain GET of the server-rendered HTML
    Http,
    /// Rendered DOM dumped by a headless browser
    Headless,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesConfig {
    #[serde(default = "default_backend")]
    pub backend: PageBackend,
    #[serde(default = "default_browser")]
    pub browser: String,
    /// Persistent browser profile (cookies, solved challenges)
    #[serde(default)]
    pub profile_dir: Option<PathBuf>,
    #[serde(default = "default_render_budget_ms")]
    pub render_budget_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Fixed pause after each downloaded voice track
    #[serde(default = "default_voice_cooldown_secs")]
    pub voice_cooldown_secs: u64,
    #[serde(default = "default_episode_cooldown_min_secs")]
    pub episode_cooldown_min_secs: u64,
    #[serde(default = "default_episode_cooldown_max_secs")]
    pub episode_cooldown_max_secs: u64,
}

// Default value functions
fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}
fn default_user_agent() -> String {
    format!("multfan-dl/{}", env!("CARGO_PKG_VERSION"))
}
fn default_backend() -> PageBackend {
    PageBackend::Http
}
fn default_browser() -> String {
    "chromium".to_string()
}
fn default_render_budget_ms() -> u64 {
    10_000
}
fn default_timeout_secs() -> u64 {
    90
}
fn default_voice_cooldown_secs() -> u64 {
    5
}
fn default_episode_cooldown_min_secs() -> u64 {
    120
}
fn default_episode_cooldown_max_secs() -> u64 {
    600
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            browser: default_browser(),
            profile_dir: None,
            render_budget_ms: default_render_budget_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            voice_cooldown_secs: default_voice_cooldown_secs(),
            episode_cooldown_min_secs: default_episode_cooldown_min_secs(),
            episode_cooldown_max_secs: default_episode_cooldown_max_secs(),
        }
    }
}

impl PacingConfig {
    /// No cooldowns at all
    pub fn immediate() -> Self {
        Self {
            voice_cooldown_secs: 0,
            episode_cooldown_min_secs: 0,
            episode_cooldown_max_secs: 0,
        }
    }
}

impl Config {
    /// Validate value ranges
    pub fn validate(&self) -> Result<()> {
        if self.site.domain.trim().is_empty() {
            anyhow::bail!("site.domain cannot be empty");
        }

        if self.site.user_agent.trim().is_empty() {
            anyhow::bail!("site.user_agent cannot be empty");
        }

        if self.pacing.episode_cooldown_min_secs > self.pacing.episode_cooldown_max_secs {
            anyhow::bail!(
                "pacing.episode_cooldown_min_secs ({}) must not exceed pacing.episode_cooldown_max_secs ({})",
                self.pacing.episode_cooldown_min_secs,
                self.pacing.episode_cooldown_max_secs
            );
        }

        if self.pages.backend == PageBackend::Headless {
            if self.pages.browser.trim().is_empty() {
                anyhow::bail!("pages.browser cannot be empty for the headless backend");
            }
            if self.pages.timeout_secs == 0 {
                anyhow::bail!("pages.timeout_secs must be greater than 0");
            }
        }

        Ok(())
    }
}

pub struct ConfigManager {
    config_dir: PathBuf,
    config_file: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Load the config from the default location, creating it if missing
    pub fn new() -> Result<Self> {
        let project_dirs = ProjectDirs::from("", "", "multfan-dl")
            .context("Failed to determine config directory")?;

        Self::from_file(project_dirs.config_dir().join("config.toml"))
    }

    /// Load the config from an explicit file, creating it if missing
    pub fn from_file(config_file: impl Into<PathBuf>) -> Result<Self> {
        let config_file = config_file.into();
        let config_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
        }

        let config = if config_file.exists() {
            Self::load_config(&config_file)?
        } else {
            let default_config = Config::default();
            Self::save_config(&config_file, &default_config)?;
            default_config
        };

        Ok(Self {
            config_dir,
            config_file,
            config,
        })
    }

    /// Get a reference to the current config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the config file path
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Validate the current configuration
    pub fn validate(&self) -> Result<()> {
        self.config.validate()
    }

    fn load_config(config_file: &Path) -> Result<Config> {
        let content = fs::read_to_string(config_file)
            .with_context(|| format!("Failed to read config file: {:?}", config_file))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_file))?;

        Ok(config)
    }

    fn save_config(config_file: &Path, config: &Config) -> Result<()> {
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(config_file, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_file))?;

        Ok(())
    }

    /// Write a default config next to the real one for reference
    pub fn create_sample_config(&self, force: bool) -> Result<PathBuf> {
        let sample_file = self.config_dir.join("config.sample.toml");
        if sample_file.exists() && !force {
            anyhow::bail!(
                "Sample config already exists at {:?} (use --force to overwrite)",
                sample_file
            );
        }

        Self::save_config(&sample_file, &Config::default())?;
        Ok(sample_file)
    }
}
