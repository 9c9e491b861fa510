//! Webhook notification delivery
//!
//! Builds a Discord-style embed for each new asset and posts it to the
//! configured webhook. Two payload shapes: a multipart form carrying the
//! embed plus the audio file, or a plain JSON post when there is no
//! attachment (or it exceeds the size ceiling).

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::extract::{AssetId, AssetMetadata};
use crate::fetch::MediaDownload;
use crate::utils::constants::SOURCE_LABEL;
pub use crate::utils::errors::NotifyError;

#[derive(Debug, Serialize)]
pub(crate) struct Embed {
    title: String,
    url: String,
    description: String,
    timestamp: String,
    footer: EmbedFooter,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<EmbedField>,
}

#[derive(Debug, Serialize)]
struct EmbedFooter {
    text: String,
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: String,
    value: String,
}

impl Embed {
    pub(crate) fn for_asset(id: &AssetId, meta: &AssetMetadata) -> Self {
        Self {
            title: meta.title.clone(),
            url: meta.asset_url.clone(),
            description: format!("Roblox audio upload (asset id: {id})"),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            footer: EmbedFooter {
                text: SOURCE_LABEL.to_string(),
            },
            fields: Vec::new(),
        }
    }

    fn push_field(&mut self, name: &str, value: &str) {
        self.fields.push(EmbedField {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
}

static URL_EXTENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.([a-z0-9]+)(?:\?|$)").expect("valid pattern"));

/// Pick a filename extension for the attachment: declared content type first,
/// then the source URL's trailing extension, then a generic binary suffix.
pub(crate) fn attachment_extension(content_type: &str, source_url: &str) -> String {
    let ct = content_type.to_lowercase();
    if ct.contains("mpeg") || ct.contains("mp3") {
        return ".mp3".to_string();
    }
    if ct.contains("ogg") {
        return ".ogg".to_string();
    }
    if let Some(captures) = URL_EXTENSION_RE.captures(source_url) {
        return format!(".{}", &captures[1]);
    }
    ".bin".to_string()
}

/// Decide the payload shape for one notification.
///
/// Returns the embed plus the media to upload as a multipart part, if any.
/// An attachment over the ceiling is dropped in favor of a "too large"
/// field; no attachment with a known media URL yields an "Audio URL" field.
pub(crate) fn build_embed<'a>(
    id: &AssetId,
    meta: &AssetMetadata,
    attachment: Option<&'a MediaDownload>,
    fits_ceiling: bool,
) -> (Embed, Option<&'a MediaDownload>) {
    let mut embed = Embed::for_asset(id, meta);
    match attachment {
        Some(media) if fits_ceiling => (embed, Some(media)),
        Some(media) => {
            embed.push_field("Audio (too large to attach)", &media.source_url);
            (embed, None)
        }
        None => {
            if let Some(audio_url) = &meta.audio_url {
                embed.push_field("Audio URL", audio_url);
            }
            (embed, None)
        }
    }
}

/// Seam between the orchestrator and webhook delivery.
#[async_trait]
pub trait NotifySink: Send + Sync {
    async fn notify(
        &self,
        id: &AssetId,
        meta: &AssetMetadata,
        attachment: Option<&MediaDownload>,
    ) -> Result<(), NotifyError>;
}

/// `NotifySink` that posts to a real webhook endpoint.
pub struct WebhookClient {
    client: reqwest::Client,
    webhook_url: String,
    /// Attachment ceiling in bytes; `None` means unlimited.
    max_file_bytes: Option<u64>,
}

impl WebhookClient {
    pub fn new(
        webhook_url: impl Into<String>,
        max_file_bytes: Option<u64>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(crate::utils::constants::FETCH_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
            max_file_bytes,
        })
    }

    fn fits_ceiling(&self, size: usize) -> bool {
        match self.max_file_bytes {
            None => true,
            Some(ceiling) => size as u64 <= ceiling,
        }
    }

    async fn send_multipart(
        &self,
        id: &AssetId,
        embed: &Embed,
        attachment: &MediaDownload,
    ) -> Result<(), NotifyError> {
        let payload = serde_json::json!({ "embeds": [embed] }).to_string();
        let filename = format!(
            "{id}{}",
            attachment_extension(&attachment.content_type, &attachment.source_url)
        );
        let form = reqwest::multipart::Form::new()
            .text("payload_json", payload)
            .part(
                "file",
                reqwest::multipart::Part::bytes(attachment.bytes.clone()).file_name(filename),
            );

        let response = self
            .client
            .post(&self.webhook_url)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status));
        }
        Ok(())
    }

    async fn send_plain(&self, embed: &Embed) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&serde_json::json!({ "embeds": [embed] }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status));
        }
        Ok(())
    }
}

#[async_trait]
impl NotifySink for WebhookClient {
    async fn notify(
        &self,
        id: &AssetId,
        meta: &AssetMetadata,
        attachment: Option<&MediaDownload>,
    ) -> Result<(), NotifyError> {
        let fits = attachment.is_some_and(|media| self.fits_ceiling(media.size));
        let (embed, attach) = build_embed(id, meta, attachment, fits);

        if let Some(media) = attach {
            match self.send_multipart(id, &embed, media).await {
                Ok(()) => {
                    info!("sent webhook with audio attachment for asset {id} - {}", meta.title);
                    return Ok(());
                }
                Err(err) => {
                    // Fall through to the plain embed post, matching the
                    // attachment-less delivery path.
                    warn!("attachment upload failed for asset {id}: {err}");
                }
            }
        }

        self.send_plain(&embed).await?;
        info!("sent embed webhook for asset {id} - {}", meta.title);
        Ok(())
    }
}
