// SoundCloud stream resolution for TrackID API
//
// This module implements the scraping client that resolves a playable stream URL
// from a SoundCloud page URL. It parses the page's hydration payload for the
// sound's transcodings, discovers a public client_id from the page's script
// assets, and asks the chosen transcoding endpoint for the stream URL.

use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

lazy_static! {
    static ref TRACK_URL_RE: Regex =
        Regex::new(r"^https?://(www\.|m\.)?(soundcloud\.com|snd\.sc)/.+$").unwrap();
    static ref HYDRATION_RE: Regex =
        Regex::new(r"window\.__sc_hydration\s*=\s*(\[.*\]);\s*</script>").unwrap();
    static ref SCRIPT_SRC_RE: Regex =
        Regex::new(r#"<script[^>]+src="(https?://[^"]+\.js)""#).unwrap();
    static ref CLIENT_ID_RE: Regex =
        Regex::new(r#"client_id\s*[:=]\s*"([0-9A-Za-z]{32})""#).unwrap();
}

/// Errors that can occur while resolving a stream URL
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// The submitted URL is not a SoundCloud URL
    #[error("Invalid SoundCloud URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure (connect, TLS, body decode)
    #[error("SoundCloud request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status returned by SoundCloud
    #[error("SoundCloud returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The page did not contain the structure we scrape
    #[error("Unrecognized page structure: {0}")]
    PageStructure(String),

    /// No client_id could be discovered from the page's script assets
    #[error("No client_id found in page script assets")]
    MissingClientId,

    /// The sound has no streamable transcoding
    #[error("Track has no streamable transcoding")]
    NoTranscoding,
}

/// Scraping client resolving SoundCloud page URLs to stream URLs
///
/// The discovered client_id is cached for the process lifetime; resolved
/// stream URLs themselves are never cached.
pub struct SoundCloudClient {
    http: reqwest::Client,
    client_id: RwLock<Option<String>>,
}

impl SoundCloudClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: RwLock::new(None),
        }
    }

    /// Resolve the stream URL behind a SoundCloud page URL
    pub async fn resolve_stream(&self, radio_url: &str) -> Result<String, ScrapeError> {
        if !TRACK_URL_RE.is_match(radio_url) {
            return Err(ScrapeError::InvalidUrl(radio_url.to_string()));
        }
        self.resolve_from_page(radio_url).await
    }

    async fn resolve_from_page(&self, page_url: &str) -> Result<String, ScrapeError> {
        let page = self.fetch_text(page_url).await?;
        let sound = extract_sound_hydration(&page)?;
        let transcoding_url = select_transcoding(&sound)?;
        let client_id = self.obtain_client_id(&page).await?;

        let endpoint = append_client_id(&transcoding_url, &client_id);
        debug!("Requesting stream endpoint: {}", transcoding_url);

        let response = self.http.get(&endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<unreadable>"));
            return Err(ScrapeError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let payload: Value = response.json().await?;
        payload
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ScrapeError::PageStructure("stream endpoint returned no url field".to_string())
            })
    }

    async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<unreadable>"));
            return Err(ScrapeError::Upstream {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.text().await?)
    }

    /// Find the public client_id embedded in one of the page's script assets
    ///
    /// The newest bundle usually carries it, so assets are scanned in reverse
    /// document order. The first hit is cached for subsequent requests.
    async fn obtain_client_id(&self, page: &str) -> Result<String, ScrapeError> {
        if let Some(id) = self.client_id.read().await.clone() {
            return Ok(id);
        }

        for src in script_sources(page).iter().rev() {
            match self.fetch_text(src).await {
                Ok(script) => {
                    if let Some(captures) = CLIENT_ID_RE.captures(&script) {
                        let id = captures[1].to_string();
                        info!("Discovered SoundCloud client_id from {}", src);
                        *self.client_id.write().await = Some(id.clone());
                        return Ok(id);
                    }
                }
                Err(e) => warn!("Failed to fetch script asset {}: {}", src, e),
            }
        }

        Err(ScrapeError::MissingClientId)
    }
}

impl Default for SoundCloudClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the `data` object of the sound entry from the page's hydration payload
fn extract_sound_hydration(page: &str) -> Result<Value, ScrapeError> {
    let raw = HYDRATION_RE
        .captures(page)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| ScrapeError::PageStructure("hydration payload not found".to_string()))?;

    let hydration: Value = serde_json::from_str(raw.as_str()).map_err(|e| {
        ScrapeError::PageStructure(format!("hydration payload is not valid JSON: {}", e))
    })?;

    hydration
        .as_array()
        .and_then(|entries| {
            entries
                .iter()
                .find(|entry| entry.get("hydratable").and_then(Value::as_str) == Some("sound"))
        })
        .and_then(|entry| entry.get("data"))
        .cloned()
        .ok_or_else(|| {
            ScrapeError::PageStructure("no sound entry in hydration payload".to_string())
        })
}

/// Pick the sound's progressive transcoding, falling back to the first available
fn select_transcoding(sound: &Value) -> Result<String, ScrapeError> {
    let transcodings = sound
        .pointer("/media/transcodings")
        .and_then(Value::as_array)
        .ok_or(ScrapeError::NoTranscoding)?;

    let progressive = transcodings
        .iter()
        .find(|t| t.pointer("/format/protocol").and_then(Value::as_str) == Some("progressive"));

    progressive
        .or_else(|| transcodings.first())
        .and_then(|t| t.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ScrapeError::NoTranscoding)
}

/// All external script asset URLs in document order
fn script_sources(page: &str) -> Vec<String> {
    SCRIPT_SRC_RE
        .captures_iter(page)
        .map(|captures| captures[1].to_string())
        .collect()
}

fn append_client_id(url: &str, client_id: &str) -> String {
    if url.contains('?') {
        format!("{}&client_id={}", url, client_id)
    } else {
        format!("{}?client_id={}", url, client_id)
    }
}
