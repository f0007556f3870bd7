use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::config::{PageBackend, PagesConfig};

/// A fetched document, owned by whoever asked for it. Dropping it releases
/// everything tied to the page.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub url: Url,
    pub html: String,
}

/// Capability that turns a URL into a fully loaded document
#[async_trait]
pub trait PageSource: Send + Sync + std::fmt::Debug {
    async fn load(&self, url: &Url) -> Result<LoadedPage>;
}

/// Build the page backend selected in the configuration
pub fn page_source(config: &PagesConfig, user_agent: &str) -> Result<Box<dyn PageSource>> {
    Ok(match config.backend {
        PageBackend::Http => Box::new(HttpPageSource::new(user_agent)?),
        PageBackend::Headless => Box::new(HeadlessPageSource::new(
            config.browser.clone(),
            config.profile_dir.clone(),
            Duration::from_millis(config.render_budget_ms),
            Duration::from_secs(config.timeout_secs),
        )),
    })
}

/// Loads the server-rendered HTML with a plain GET
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn load(&self, url: &Url) -> Result<LoadedPage> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to request {}", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} for {}", status, url);
        }

        // Redirects move the base that relative links resolve against.
        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .with_context(|| format!("Failed to read page body of {}", url))?;

        Ok(LoadedPage {
            url: final_url,
            html,
        })
    }
}

/// Renders pages in a headless Chromium-compatible browser and returns the
/// resulting DOM, so player markup injected by scripts is visible.
#[derive(Debug, Clone)]
pub struct HeadlessPageSource {
    browser: String,
    profile_dir: Option<PathBuf>,
    render_budget: Duration,
    timeout: Duration,
}

impl HeadlessPageSource {
    pub fn new(
        browser: String,
        profile_dir: Option<PathBuf>,
        render_budget: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            browser,
            profile_dir,
            render_budget,
            timeout,
        }
    }

    fn command(&self, url: &Url) -> Command {
        let mut cmd = Command::new(&self.browser);
        cmd.arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--mute-audio")
            .arg(format!(
                "--virtual-time-budget={}",
                self.render_budget.as_millis()
            ));

        if let Some(profile) = &self.profile_dir {
            cmd.arg(format!("--user-data-dir={}", profile.display()));
        }

        cmd.arg("--dump-dom")
            .arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd
    }
}

#[async_trait]
impl PageSource for HeadlessPageSource {
    async fn load(&self, url: &Url) -> Result<LoadedPage> {
        tracing::debug!(url = %url, browser = %self.browser, "Rendering page");

        let output = tokio::time::timeout(self.timeout, self.command(url).output())
            .await
            .with_context(|| format!("Timed out after {:?} rendering {}", self.timeout, url))?
            .with_context(|| format!("Failed to launch browser '{}'", self.browser))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "Browser exited with {} while rendering {}: {}",
                output.status,
                url,
                stderr.trim()
            );
        }

        Ok(LoadedPage {
            url: url.clone(),
            html: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
