pub mod acquire;
pub mod config;
pub mod download;
pub mod layout;
pub mod pacer;
pub mod site;

// Re-export commonly used types for easier access in tests
pub use acquire::{
    AcquireError, AcquisitionOptions, AcquisitionReport, EpisodeError, Orchestrator, Selection,
};
pub use config::{Config, ConfigManager, PacingConfig};
pub use download::{DownloadEngine, DownloadError, DownloadProgress, Transfer};
pub use layout::AcquisitionTarget;
pub use site::{Episode, HttpPageSource, PageSource, Season, SiteNavigator, Voice};
