//! Best-effort extraction heuristics over raw storefront markup
//!
//! These are unstructured-text scans, not an HTML parser. They must tolerate
//! malformed or partial markup without failing; false negatives are
//! acceptable. Patterns are compiled once via `Lazy` statics.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Identifier of a remote asset, extracted from markup.
///
/// Equality and hashing are string-based (seen-set membership); [`numeric`]
/// exists only for descending sort order during a scan.
///
/// [`numeric`]: AssetId::numeric
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        AssetId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value for sort ordering. Non-numeric ids sort last (0).
    pub fn numeric(&self) -> u64 {
        self.0.parse().unwrap_or(0)
    }

    /// Page URL of the asset on the storefront.
    pub fn page_url(&self) -> String {
        format!("{}/{}", crate::utils::constants::STORE_BASE_URL, self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display metadata derived from one asset's page. Not cached across cycles.
#[derive(Debug, Clone)]
pub struct AssetMetadata {
    pub title: String,
    pub asset_url: String,
    pub audio_url: Option<String>,
}

impl AssetMetadata {
    /// Derive title and media URL from the asset's page markup.
    pub fn from_page(html: &str, id: &AssetId) -> Self {
        Self {
            title: extract_title(html, id),
            asset_url: id.page_url(),
            audio_url: find_audio_url(html),
        }
    }

    /// Placeholder used when the asset page could not be fetched.
    pub fn fallback(id: &AssetId) -> Self {
        Self {
            title: format!("Asset {id}"),
            asset_url: id.page_url(),
            audio_url: None,
        }
    }
}

/// Relative store links: `/store/asset/<digits>` with an optional trailing
/// path segment.
static RELATIVE_ASSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"/store/asset/(\d+)(?:/[^\s"'<>]*)?"#).expect("valid pattern"));

/// Absolute store links with the fixed storefront host.
static ABSOLUTE_ASSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://create\.roblox\.com/store/asset/(\d+)(?:/[^\s"'<>]*)?"#)
        .expect("valid pattern")
});

static OG_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+property=["']og:title["']\s+content=["']([^"']+)["']"#)
        .expect("valid pattern")
});

static TITLE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").expect("valid pattern"));

/// Direct media-file URLs anywhere in the text.
static AUDIO_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)https?://[^"'<>]+?\.(?:mp3|ogg)(?:\?[^"'<>]*)?"#).expect("valid pattern")
});

/// Structured-looking key/value pairs carrying a media URL, e.g.
/// `"downloadUrl": "https://cdn.example/track.ogg"`.
static AUDIO_KV_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)["'](?:audio|downloadUrl|source|url)["']\s*:\s*["'](https?://[^"']+\.(?:mp3|ogg)(?:\?[^"']*)?)["']"#,
    )
    .expect("valid pattern")
});

/// Scan markup for asset identifiers.
///
/// Unions relative-path and absolute-URL matches; duplicates collapse via set
/// semantics.
pub fn extract_asset_ids(html: &str) -> HashSet<AssetId> {
    let mut ids = HashSet::new();
    for captures in RELATIVE_ASSET_RE.captures_iter(html) {
        ids.insert(AssetId::new(&captures[1]));
    }
    for captures in ABSOLUTE_ASSET_RE.captures_iter(html) {
        ids.insert(AssetId::new(&captures[1]));
    }
    ids
}

/// Derive a display title for an asset page.
///
/// Fallback order: Open-Graph title meta-tag, then the `<title>` element,
/// then a synthesized `Asset {id}` string.
pub fn extract_title(html: &str, fallback_id: &AssetId) -> String {
    if let Some(captures) = OG_TITLE_RE.captures(html) {
        let title = captures[1].trim();
        if !title.is_empty() {
            return title.to_string();
        }
    }
    if let Some(captures) = TITLE_TAG_RE.captures(html) {
        let title = captures[1].trim();
        if !title.is_empty() {
            return title.to_string();
        }
    }
    format!("Asset {fallback_id}")
}

/// Locate a direct media URL in an asset page.
///
/// Prefers an `.mp3` match when multiple direct URLs exist, otherwise returns
/// the first; falls back to structured key/value pairs; `None` means "notify
/// without attachment", not an error.
pub fn find_audio_url(html: &str) -> Option<String> {
    let found: Vec<&str> = AUDIO_URL_RE.find_iter(html).map(|m| m.as_str()).collect();
    if !found.is_empty() {
        if let Some(mp3) = found.iter().find(|u| u.to_lowercase().contains(".mp3")) {
            return Some((*mp3).to_string());
        }
        return Some(found[0].to_string());
    }

    AUDIO_KV_RE
        .captures(html)
        .map(|captures| captures[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_and_absolute_references_collapse_to_one_id() {
        let html = r#"
            <a href="/store/asset/123/cool-song">listen</a>
            <link href="https://create.roblox.com/store/asset/123">
        "#;
        let ids = extract_asset_ids(html);
        assert_eq!(ids.len(), 1);
        assert!(ids.contains(&AssetId::new("123")));
    }

    #[test]
    fn multiple_ids_are_all_found() {
        let html = r#"/store/asset/5 /store/asset/7/x https://create.roblox.com/store/asset/9"#;
        let ids = extract_asset_ids(html);
        let mut found: Vec<&str> = ids.iter().map(AssetId::as_str).collect();
        found.sort();
        assert_eq!(found, vec!["5", "7", "9"]);
    }

    #[test]
    fn ids_survive_malformed_markup() {
        let html = "<div><<<>>'\"/store/asset/42";
        assert!(extract_asset_ids(html).contains(&AssetId::new("42")));
    }

    #[test]
    fn other_hosts_do_not_match_the_absolute_pattern() {
        let html = "https://evil.example.com/store/asset/13";
        // The relative pattern still fires on the path portion; the id is the
        // same either way, so the union is what matters.
        let ids = extract_asset_ids("https://evil.example.com/elsewhere/99");
        assert!(ids.is_empty());
        assert!(extract_asset_ids(html).contains(&AssetId::new("13")));
    }

    #[test]
    fn og_title_wins_over_title_tag() {
        let html = r#"<meta property="og:title" content=" My Track "><title>Page</title>"#;
        assert_eq!(extract_title(html, &AssetId::new("1")), "My Track");
    }

    #[test]
    fn title_tag_is_the_second_choice() {
        let html = "<html><title>Fallback Track</title></html>";
        assert_eq!(extract_title(html, &AssetId::new("1")), "Fallback Track");
    }

    #[test]
    fn blank_og_title_falls_through_to_title_tag() {
        let html = r#"<meta property="og:title" content="   "><title>Real Title</title>"#;
        assert_eq!(extract_title(html, &AssetId::new("1")), "Real Title");
    }

    #[test]
    fn synthesized_title_when_nothing_matches() {
        assert_eq!(extract_title("<p>nope</p>", &AssetId::new("77")), "Asset 77");
    }

    #[test]
    fn mp3_preferred_over_earlier_ogg() {
        let html = r#"src="https://cdn.example/a.ogg" src="https://cdn.example/b.mp3""#;
        assert_eq!(
            find_audio_url(html).as_deref(),
            Some("https://cdn.example/b.mp3")
        );
    }

    #[test]
    fn first_match_returned_when_no_mp3() {
        let html = r#"x https://cdn.example/a.ogg y https://cdn.example/b.ogg"#;
        assert_eq!(
            find_audio_url(html).as_deref(),
            Some("https://cdn.example/a.ogg")
        );
    }

    #[test]
    fn key_value_pairs_yield_a_url() {
        let html = r#"<script>{"downloadUrl": "https://cdn.example/t.mp3?sig=1"}</script>"#;
        assert_eq!(
            find_audio_url(html).as_deref(),
            Some("https://cdn.example/t.mp3?sig=1")
        );
    }

    #[test]
    fn key_value_fallback_fires_when_the_direct_scan_cannot_match() {
        // Angle brackets stop the direct scan but not the key/value pattern.
        let html = r#"{"source": "https://cdn.example/a<b>.ogg"}"#;
        assert_eq!(
            find_audio_url(html).as_deref(),
            Some("https://cdn.example/a<b>.ogg")
        );
    }

    #[test]
    fn no_audio_means_none() {
        assert_eq!(find_audio_url("<html>silence</html>"), None);
    }

    #[test]
    fn numeric_sorts_non_numeric_last() {
        assert_eq!(AssetId::new("abc").numeric(), 0);
        assert_eq!(AssetId::new("42").numeric(), 42);
    }
}
