//! Scan orchestration
//!
//! Drives one polling cycle: page fetch, identifier collection, new-item
//! detection, per-item processing, seen-set update. Invoked once at startup
//! and then on a fixed interval. Cycles run sequentially on one task, so a
//! slow cycle delays the next tick instead of overlapping it.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use url::Url;

use crate::Config;
use crate::extract::{self, AssetId, AssetMetadata};
use crate::fetch::PageSource;
use crate::notify::NotifySink;
use crate::seen::SeenSet;
use crate::utils::constants::INTER_ITEM_DELAY;

static PAGE_PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"pageNumber=\d+").expect("valid pattern"));

/// Derive the URL for one listing page by setting or replacing the
/// `pageNumber` query parameter on the base URL.
///
/// Falls back to plain string editing when the base does not parse as a URL.
pub fn build_page_url(base: &str, page: u32) -> String {
    match Url::parse(base) {
        Ok(mut url) => {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(key, _)| key != "pageNumber")
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .append_pair("pageNumber", &page.to_string());
            url.to_string()
        }
        Err(_) => {
            if base.contains("pageNumber=") {
                PAGE_PARAM_RE
                    .replace(base, format!("pageNumber={page}"))
                    .into_owned()
            } else {
                let sep = if base.contains('?') { '&' } else { '?' };
                format!("{base}{sep}pageNumber={page}")
            }
        }
    }
}

/// Owns all mutable monitor state: the seen-set and the first-run flag.
pub struct Scanner<S: PageSource, N: NotifySink> {
    config: Config,
    source: S,
    sink: N,
    seen: SeenSet,
    first_run: bool,
}

impl<S: PageSource, N: NotifySink> Scanner<S, N> {
    pub fn new(config: Config, source: S, sink: N, seen: SeenSet) -> Self {
        Self {
            config,
            source,
            sink,
            seen,
            first_run: true,
        }
    }

    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Run cycles forever: one immediately, then on the configured interval.
    pub async fn run(&mut self) {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }

    /// One complete poll-extract-notify pass across all configured pages.
    pub async fn run_cycle(&mut self) {
        info!("scanning artist pages");

        let mut all_ids: HashSet<AssetId> = HashSet::new();
        for page in 0..self.config.page_count() {
            let page_url = build_page_url(&self.config.artist_url, page);
            match self.source.fetch_page(&page_url).await {
                Ok(html) => all_ids.extend(extract::extract_asset_ids(&html)),
                Err(err) => error!("error fetching {page_url}: {err}"),
            }
        }

        let mut ids: Vec<AssetId> = all_ids.into_iter().collect();
        ids.sort_by(|a, b| b.numeric().cmp(&a.numeric()));
        if ids.is_empty() {
            info!("no assets found on artist pages");
        }

        if self.first_run && !self.config.send_existing_on_first_run {
            info!(
                "first run: marking {} existing item(s) as seen without notifying",
                ids.len()
            );
            for id in ids {
                self.seen.insert(id);
            }
            if let Err(err) = self.seen.save() {
                error!("could not persist seen-set: {err}");
            }
        } else {
            let new_ids: Vec<AssetId> = ids
                .into_iter()
                .filter(|id| !self.seen.contains(id))
                .collect();
            if new_ids.is_empty() {
                info!("no new assets to notify");
            }
            for id in &new_ids {
                self.process_item(id).await;
                tokio::time::sleep(INTER_ITEM_DELAY).await;
            }
        }

        self.first_run = false;
    }

    /// Resolve metadata, optionally fetch media, notify, mark seen.
    ///
    /// Every failure is logged and swallowed so one bad item cannot abort the
    /// rest of the cycle. The id is marked seen even when delivery failed; a
    /// failed delivery therefore permanently suppresses that item. Known
    /// tradeoff, kept from the original behavior.
    async fn process_item(&mut self, id: &AssetId) {
        let meta = match self.source.fetch_page(&id.page_url()).await {
            Ok(html) => AssetMetadata::from_page(&html, id),
            Err(err) => {
                warn!("could not fetch page for asset {id}: {err}");
                AssetMetadata::fallback(id)
            }
        };

        let attachment = match &meta.audio_url {
            Some(audio_url) => match self.source.fetch_binary(audio_url).await {
                Ok(media) => Some(media),
                Err(err) => {
                    error!("failed to download audio from {audio_url}: {err}");
                    None
                }
            },
            None => None,
        };

        if let Err(err) = self.sink.notify(id, &meta, attachment.as_ref()).await {
            error!("failed to deliver webhook for asset {id}: {err}");
        }

        self.seen.insert(id.clone());
        if let Err(err) = self.seen.save() {
            error!("could not persist seen-set: {err}");
        }
    }
}
