//! Status composition and posting to X.
//!
//! The status text is built from the fill levels, either through a user
//! template or a fixed one-line summary, and posted through the X API v2 with
//! the chart attached. See [`oauth`] for the accepted credentials.
//!
//! Posting is off unless explicitly enabled, and silently skipped when no
//! credentials are configured. Delivery is best effort: one attempt, no retry.
//!
//! # Template placeholders
//!
//! | Placeholder | Value |
//! |-------------|-------|
//! | `{{IST}}` | İstanbul fill level, two decimals |
//! | `{{BURSA}}` | Bursa fill level |
//! | `{{IZMIR}}` | İzmir fill level |
//! | `{{ANKARA}}` | Ankara fill level |

pub mod oauth;

use crate::models::{City, LevelSnapshot};
use crate::utils::take_chars;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument, warn};

pub use oauth::XCredentials;

/// Longest status we send, leaving room for the platform's link shortening.
pub const MAX_STATUS_CHARS: usize = 270;

const FALLBACK_STATUS: &str = "Baraj doluluk oranları";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the status text for `snapshot`, appending `share_url` on its own line.
pub fn compose_status(
    template: Option<&str>,
    snapshot: &LevelSnapshot,
    share_url: Option<&str>,
) -> String {
    let text = match template.filter(|t| !t.is_empty()) {
        Some(template) => City::ALL.iter().fold(template.to_string(), |acc, city| {
            acc.replace(
                &format!("{{{{{}}}}}", city.template_key()),
                &format!("{:.2}", snapshot.pct(*city)),
            )
        }),
        None => City::ALL
            .iter()
            .map(|city| format!("{} %{:.2}", city, snapshot.pct(*city)))
            .collect::<Vec<_>>()
            .join(" • "),
    };
    match share_url.filter(|u| !u.is_empty()) {
        Some(url) => format!("{text}\n{url}"),
        None => text,
    }
}

/// Trim and cut a status to [`MAX_STATUS_CHARS`], never returning it empty.
pub fn prepare_status(text: &str) -> String {
    let cut = take_chars(text.trim(), MAX_STATUS_CHARS);
    if cut.is_empty() {
        FALLBACK_STATUS.to_string()
    } else {
        cut
    }
}

/// Media type for images X accepts, by file extension.
fn image_media_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Posting switches and credentials.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub enabled: bool,
    pub text_only: bool,
    pub credentials: Option<XCredentials>,
    pub api_base: String,
}

/// What [`XPublisher::post`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Disabled,
    MissingCredentials,
    Posted { id: String, with_media: bool },
}

#[derive(Debug, Deserialize)]
struct IdEnvelope {
    data: IdData,
}

#[derive(Debug, Deserialize)]
struct IdData {
    id: String,
}

/// Posts statuses, optionally with an image, to X.
#[derive(Debug)]
pub struct XPublisher {
    config: PublisherConfig,
    client: Client,
}

impl XPublisher {
    pub fn new(config: PublisherConfig) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { config, client })
    }

    /// Post `text` with the image at `image_path`, honouring the switches.
    ///
    /// Images in a format X does not accept are left out and the status is
    /// posted as text.
    #[instrument(level = "info", skip_all, fields(image = %image_path.display()))]
    pub async fn post(&self, image_path: &Path, text: &str) -> Result<PublishOutcome, Box<dyn Error>> {
        if !self.config.enabled {
            info!("Posting to X is disabled");
            return Ok(PublishOutcome::Disabled);
        }
        let Some(credentials) = &self.config.credentials else {
            warn!("X credentials missing; not posting");
            return Ok(PublishOutcome::MissingCredentials);
        };

        let status = prepare_status(text);
        let media_id = if self.config.text_only {
            None
        } else {
            match image_media_type(image_path) {
                Some(media_type) => {
                    Some(self.upload_media(credentials, image_path, media_type).await?)
                }
                None => {
                    info!("Image format not accepted by X; posting text only");
                    None
                }
            }
        };

        let mut body = json!({ "text": status });
        if let Some(id) = &media_id {
            body["media"] = json!({ "media_ids": [id] });
        }

        let url = format!("{}/2/tweets", self.config.api_base);
        let resp = credentials
            .authorize(self.client.post(&url), "POST", &url)?
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let posted: IdEnvelope = resp.json().await?;
        info!(id = %posted.data.id, with_media = media_id.is_some(), "Posted to X");

        Ok(PublishOutcome::Posted {
            id: posted.data.id,
            with_media: media_id.is_some(),
        })
    }

    async fn upload_media(
        &self,
        credentials: &XCredentials,
        image_path: &Path,
        media_type: &str,
    ) -> Result<String, Box<dyn Error>> {
        let bytes = fs::read(image_path).await?;
        let file_name = image_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("chart")
            .to_string();
        let part = Part::bytes(bytes).file_name(file_name).mime_str(media_type)?;
        let form = Form::new()
            .part("media", part)
            .text("media_category", "tweet_image");

        let url = format!("{}/2/media/upload", self.config.api_base);
        let resp = credentials
            .authorize(self.client.post(&url), "POST", &url)?
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        let uploaded: IdEnvelope = resp.json().await?;
        info!(media_id = %uploaded.data.id, "Uploaded image");
        Ok(uploaded.data.id)
    }
}
