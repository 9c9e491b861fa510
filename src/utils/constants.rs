//! Shared configuration constants for the monitor
//!
//! Default values used throughout the codebase to ensure consistency and
//! avoid magic numbers.

use std::time::Duration;

/// Identity sent with every outbound request unless overridden in config.
pub const DEFAULT_USER_AGENT: &str = "RobloxArtistMonitor/1.0";

/// Accept header for page fetches.
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml";

/// Transport timeout for page and media fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Absolute-URL host prefix recognized by the identifier extractor and used
/// when building per-asset page URLs.
pub const STORE_BASE_URL: &str = "https://create.roblox.com/store/asset";

/// Footer label attached to every outbound notification.
pub const SOURCE_LABEL: &str = "Roblox Artist Monitor";

/// Politeness pause between per-item notifications within one cycle.
pub const INTER_ITEM_DELAY: Duration = Duration::from_millis(500);
