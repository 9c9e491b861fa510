//! Artist page monitor
//!
//! Polls a storefront artist page for newly published audio assets,
//! deduplicates against a durable seen-set, and relays notifications
//! (with optional audio attachment) to a webhook endpoint.

pub mod extract;
pub mod fetch;
pub mod notify;
pub mod scanner;
pub mod seen;
mod utils;

use std::fs;
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

/// Monitor configuration, loaded once at startup from `config.json`.
///
/// Field names match the JSON keys used by the config file (camelCase).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Artist storefront URL to poll. Required.
    pub artist_url: String,

    /// Webhook endpoint receiving notifications. Required.
    pub webhook_url: String,

    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    #[serde(default = "default_pages_to_check")]
    pub pages_to_check: u32,

    /// When false (the default), the first scan marks everything it finds
    /// as seen without notifying, to avoid a flood on initial deployment.
    #[serde(default)]
    pub send_existing_on_first_run: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Attachment size ceiling in megabytes. 0 disables the ceiling.
    #[serde(default = "default_max_file_size_mb", rename = "maxFileSizeMB")]
    pub max_file_size_mb: f64,
}

fn default_poll_interval_seconds() -> u64 {
    60
}
fn default_pages_to_check() -> u32 {
    1
}
fn default_user_agent() -> String {
    crate::utils::constants::DEFAULT_USER_AGENT.to_string()
}
fn default_max_file_size_mb() -> f64 {
    8.0
}

impl Config {
    /// Poll interval with the 5-second floor applied.
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_seconds.max(5))
    }

    /// Number of pages to scan per cycle, at least 1.
    pub fn page_count(&self) -> u32 {
        self.pages_to_check.max(1)
    }

    /// Attachment ceiling in bytes. `None` means unlimited.
    pub fn max_file_bytes(&self) -> Option<u64> {
        let bytes = (self.max_file_size_mb.max(0.0) * 1024.0 * 1024.0) as u64;
        if bytes == 0 { None } else { Some(bytes) }
    }
}

/// Load config from a JSON file.
///
/// Any failure here is fatal: a missing file, unreadable JSON, or a missing
/// required field terminates startup before any network activity.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("missing config file {}", path.display()))?;
    let config: Config = serde_json::from_str(&contents)
        .with_context(|| format!("could not parse {}", path.display()))?;

    if config.artist_url.trim().is_empty() || config.webhook_url.trim().is_empty() {
        anyhow::bail!("artistUrl and webhookUrl must be set in {}", path.display());
    }
    Ok(config)
}

pub use extract::AssetId;
pub use fetch::{FetchError, HttpFetcher, MediaDownload, PageSource};
pub use notify::{NotifySink, WebhookClient};
pub use scanner::Scanner;
pub use seen::SeenSet;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_for_omitted_fields() {
        let config: Config = serde_json::from_str(
            r#"{"artistUrl": "https://example.com/a", "webhookUrl": "https://example.com/w"}"#,
        )
        .unwrap();
        assert_eq!(config.poll_interval_seconds, 60);
        assert_eq!(config.pages_to_check, 1);
        assert!(!config.send_existing_on_first_run);
        assert_eq!(config.max_file_size_mb, 8.0);
        assert_eq!(config.max_file_bytes(), Some(8 * 1024 * 1024));
    }

    #[test]
    fn poll_interval_floor_is_five_seconds() {
        let config: Config = serde_json::from_str(
            r#"{"artistUrl": "u", "webhookUrl": "w", "pollIntervalSeconds": 1}"#,
        )
        .unwrap();
        assert_eq!(config.poll_interval(), std::time::Duration::from_secs(5));
    }

    #[test]
    fn page_count_floor_is_one() {
        let config: Config = serde_json::from_str(
            r#"{"artistUrl": "u", "webhookUrl": "w", "pagesToCheck": 0}"#,
        )
        .unwrap();
        assert_eq!(config.page_count(), 1);
    }

    #[test]
    fn zero_ceiling_means_unlimited() {
        let config: Config = serde_json::from_str(
            r#"{"artistUrl": "u", "webhookUrl": "w", "maxFileSizeMB": 0}"#,
        )
        .unwrap();
        assert_eq!(config.max_file_bytes(), None);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"artistUrl": "https://example.com/a"}"#).unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn missing_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(&dir.path().join("config.json")).is_err());
    }
}
