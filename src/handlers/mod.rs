pub mod config;
pub mod download;
pub mod list;

use anyhow::Result;
use multfan_dl::config::Config;
use multfan_dl::site::{self, SiteNavigator};

// Re-export all handlers
pub use config::handle_config;
pub use download::handle_download;
pub use list::handle_list;

/// Navigator backed by the page source the config asks for
pub fn navigator_from_config(config: &Config) -> Result<SiteNavigator> {
    let pages = site::page::page_source(&config.pages, &config.site.user_agent)?;
    Ok(SiteNavigator::new(pages))
}
