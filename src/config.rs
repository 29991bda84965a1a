//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development. Without a GCP project the
//! service runs against the in-memory store.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::models::FilterOptions;
use crate::services::FeedConfig;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID; `None` selects the in-memory store
    pub gcp_project_id: Option<String>,
    /// Server port
    pub port: u16,

    // --- Feed tunables ---
    /// Size of the realtime window
    pub realtime_limit: usize,
    /// Activities per history page
    pub page_size: usize,
    /// Maximum number of history activities held
    pub max_history: usize,
    /// How often the Firestore realtime window is re-queried
    pub poll_interval: Duration,

    // --- Initial viewer state ---
    pub viewer_id: Option<String>,
    pub hide_bots: bool,
    pub show_only_mine: bool,
}

impl Config {
    /// Config for tests: memory store, small pages, no viewer.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: None,
            port: 8080,
            realtime_limit: 20,
            page_size: 20,
            max_history: 500,
            poll_interval: Duration::from_secs(5),
            viewer_id: None,
            hide_bots: false,
            show_only_mine: false,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: non_empty_var("GCP_PROJECT_ID"),
            port: parse_var("PORT", 8080)?,
            realtime_limit: positive(parse_var("FEED_REALTIME_LIMIT", 20)?, "FEED_REALTIME_LIMIT")?,
            page_size: positive(parse_var("FEED_PAGE_SIZE", 20)?, "FEED_PAGE_SIZE")?,
            max_history: parse_var("FEED_MAX_HISTORY", 500)?,
            poll_interval: Duration::from_secs(positive(
                parse_var("FEED_POLL_INTERVAL_SECS", 5)?,
                "FEED_POLL_INTERVAL_SECS",
            )?),
            viewer_id: non_empty_var("FEED_VIEWER_ID"),
            hide_bots: parse_var("FEED_HIDE_BOTS", false)?,
            show_only_mine: parse_var("FEED_SHOW_ONLY_MINE", false)?,
        })
    }

    /// Feed controller settings derived from this config.
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            realtime_limit: self.realtime_limit,
            page_size: self.page_size,
            max_history: self.max_history,
            filters: FilterOptions {
                show_only_mine: self.show_only_mine,
                hide_bots: self.hide_bots,
            },
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

fn positive<T: Default + PartialOrd + ToString>(
    value: T,
    name: &'static str,
) -> Result<T, ConfigError> {
    if value > T::default() {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
