//! HTTP page and media fetching
//!
//! One shared `reqwest::Client` carries the configured identity and a bounded
//! timeout for every request. No retries: callers treat a [`FetchError`] as
//! "skip this source, continue the cycle".

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::debug;

pub use crate::utils::errors::FetchError;
use crate::utils::constants::{ACCEPT_HTML, FETCH_TIMEOUT};

/// Binary media content downloaded for attachment.
///
/// The size ceiling is enforced by the notifier, not here; the transport
/// itself is unbounded.
#[derive(Debug, Clone)]
pub struct MediaDownload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub size: usize,
    pub source_url: String,
}

/// Seam between the orchestrator and the network, so one cycle can be tested
/// against canned markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Retrieve raw markup for a URL.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;

    /// Download binary media content.
    async fn fetch_binary(&self, url: &str) -> Result<MediaDownload, FetchError>;
}

/// `PageSource` backed by a real HTTP client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with the given identity header and the fixed
    /// 20-second transport timeout.
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        debug!("fetching page {url}");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPT_HTML)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response.text().await?)
    }

    async fn fetch_binary(&self, url: &str) -> Result<MediaDownload, FetchError> {
        debug!("downloading media {url}");
        let response = self.client.get(url).header(ACCEPT, "*/*").send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        Ok(MediaDownload {
            size: bytes.len(),
            content_type,
            source_url: url.to_string(),
            bytes,
        })
    }
}
