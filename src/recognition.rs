// Recognition client for TrackID API
//
// This module implements the client for the external audio-fingerprinting service.
// It builds the outbound multipart request from a stored upload, attaches a credential
// from the configured key pool, and rotates to the next key when the service reports
// that a key's monthly quota is exhausted (HTTP 405).

use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::config::{defaults, RecognitionConfig};
use crate::models::{TrackResult, UploadedAudio};

/// Ordered pool of API credentials, parsed once from configuration
#[derive(Debug, Clone)]
pub struct KeyPool {
    keys: Vec<String>,
}

impl KeyPool {
    /// Parse a comma-separated credential list, dropping empty segments
    pub fn from_csv(csv: &str) -> Self {
        let keys = csv
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect();
        Self { keys }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Errors that can occur while talking to the recognition service
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// Transport-level failure (connect, TLS, body decode)
    #[error("Recognition service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status returned by the service
    #[error("Recognition service returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    /// No credentials were configured
    #[error("No API keys configured for the recognition service")]
    NoKeys,

    /// Failure reading the stored upload
    #[error("Failed to read uploaded file: {0}")]
    Io(#[from] std::io::Error),
}

impl RecognitionError {
    /// The service signals a depleted monthly quota with HTTP 405
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, RecognitionError::Upstream { status: 405, .. })
    }
}

/// Whether a failed attempt should be retried with the next key in the pool
///
/// Only quota exhaustion is recoverable, and only while a next key exists.
fn should_rotate(err: &RecognitionError, key_index: usize, pool_len: usize) -> bool {
    err.is_quota_exhausted() && key_index + 1 < pool_len
}

/// Payload returned by the recognition endpoint
#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    track: Option<TrackPayload>,
}

#[derive(Debug, Deserialize)]
struct TrackPayload {
    title: String,
    subtitle: String,
    images: Option<TrackImages>,
}

#[derive(Debug, Deserialize)]
struct TrackImages {
    coverart: Option<String>,
}

fn map_track_payload(payload: RecognizeResponse) -> TrackResult {
    match payload.track {
        Some(track) => TrackResult::identified(
            track.title,
            track.subtitle,
            track.images.and_then(|images| images.coverart),
        ),
        None => TrackResult::unidentified(),
    }
}

/// Client for the external audio-fingerprinting service
pub struct RecognitionClient {
    http: reqwest::Client,
    endpoint: String,
    api_host: String,
    keys: KeyPool,
}

impl RecognitionClient {
    pub fn new(config: &RecognitionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_host: config.api_host.clone(),
            keys: KeyPool::from_csv(&config.api_keys),
        }
    }

    /// Number of configured credentials
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Identify a track from a stored audio upload
    ///
    /// The file is buffered once and every attempt reuses the same bytes, so a
    /// failed attempt can never leave a half-consumed stream for the next key.
    /// Attempts are strictly sequential; rotation stops at the last pool index
    /// and the final error is surfaced with its original status and message.
    pub async fn identify(&self, audio: &UploadedAudio) -> Result<TrackResult, RecognitionError> {
        if self.keys.is_empty() {
            return Err(RecognitionError::NoKeys);
        }

        let data = tokio::fs::read(&audio.path).await?;
        let filename = audio
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| String::from("blob"));

        let mut key_index = 0;
        loop {
            match self.attempt(&data, &filename, key_index).await {
                Ok(result) => return Ok(result),
                Err(err) if should_rotate(&err, key_index, self.keys.len()) => {
                    warn!(
                        "API key {} exhausted its monthly quota, rotating to key {}",
                        key_index,
                        key_index + 1
                    );
                    key_index += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Perform a single recognition attempt with the key at `key_index`
    async fn attempt(
        &self,
        data: &[u8],
        filename: &str,
        key_index: usize,
    ) -> Result<TrackResult, RecognitionError> {
        let key = self.keys.get(key_index).ok_or(RecognitionError::NoKeys)?;
        debug!("Recognition attempt with key index {}", key_index);

        // Part::bytes keeps every part sized, so the request carries an exact
        // Content-Length instead of chunked encoding; the upstream rejects
        // uploads without correct multipart headers.
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str(defaults::UPLOAD_MIME)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-rapidapi-key", key)
            .header("x-rapidapi-host", &self.api_host)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<unreadable>"));
            return Err(RecognitionError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let payload: RecognizeResponse = response.json().await?;
        let result = map_track_payload(payload);
        if let TrackResult::Identified { title, artist, .. } = &result {
            info!("Identified track: {} - {}", artist, title);
        } else {
            info!("Recognition service found no match for the sample");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNIDENTIFIED_MESSAGE;
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    #[test]
    fn test_key_pool_parsing() {
        let pool = KeyPool::from_csv("first, second ,,third");
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.get(0), Some("first"));
        assert_eq!(pool.get(1), Some("second"));
        assert_eq!(pool.get(2), Some("third"));
        assert_eq!(pool.get(3), None);

        assert!(KeyPool::from_csv("").is_empty());
        assert!(KeyPool::from_csv(" , ").is_empty());
    }

    #[test]
    fn test_should_rotate_on_quota_with_keys_left() {
        let quota = RecognitionError::Upstream {
            status: 405,
            message: "quota".to_string(),
        };
        assert!(should_rotate(&quota, 0, 2));
        assert!(should_rotate(&quota, 2, 4));
    }

    #[test]
    fn test_should_not_rotate_past_last_key() {
        let quota = RecognitionError::Upstream {
            status: 405,
            message: "quota".to_string(),
        };
        assert!(!should_rotate(&quota, 1, 2));
        assert!(!should_rotate(&quota, 0, 1));
        assert!(!should_rotate(&quota, 0, 0));
    }

    #[test]
    fn test_should_not_rotate_on_other_errors() {
        let server_error = RecognitionError::Upstream {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!should_rotate(&server_error, 0, 4));
        assert!(!should_rotate(&RecognitionError::NoKeys, 0, 4));
    }

    #[test]
    fn test_map_track_payload_with_track() {
        let payload: RecognizeResponse = serde_json::from_str(
            r#"{"track": {"title": "Song", "subtitle": "Artist", "images": {"coverart": "https://img.example/c.jpg"}}}"#,
        )
        .unwrap();

        assert_eq!(
            map_track_payload(payload),
            TrackResult::identified(
                "Song".to_string(),
                "Artist".to_string(),
                Some("https://img.example/c.jpg".to_string())
            )
        );
    }

    #[test]
    fn test_map_track_payload_without_track() {
        let payload: RecognizeResponse = serde_json::from_str("{}").unwrap();
        let result = map_track_payload(payload);
        assert_eq!(
            result,
            TrackResult::Unidentified {
                identified: false,
                message: UNIDENTIFIED_MESSAGE.to_string()
            }
        );
    }

    fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    /// Read a full HTTP request (headers plus Content-Length body) from the socket
    async fn read_request(sock: &mut TcpStream) {
        let mut data = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = sock.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            data.extend_from_slice(&buf[..n]);
            if let Some(end) = find_subslice(&data, b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&data[..end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= end + 4 + content_length {
                    return;
                }
            }
        }
    }

    /// Minimal upstream stub answering each connection with the next canned response
    async fn spawn_upstream(responses: Vec<(u16, &'static str)>) -> (SocketAddr, JoinHandle<usize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut served = 0;
            for (status, body) in responses {
                let (mut sock, _) = listener.accept().await.unwrap();
                read_request(&mut sock).await;
                let response = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                sock.write_all(response.as_bytes()).await.unwrap();
                sock.shutdown().await.ok();
                served += 1;
            }
            served
        });
        (addr, handle)
    }

    fn client_for(addr: SocketAddr, keys: &str) -> RecognitionClient {
        RecognitionClient::new(&RecognitionConfig {
            endpoint: format!("http://{}/v1/tracks/recognize", addr),
            api_host: "shazam-core.p.rapidapi.com".to_string(),
            api_keys: keys.to_string(),
        })
    }

    fn sample_upload(name: &str) -> UploadedAudio {
        let path: PathBuf = std::env::temp_dir().join(format!(
            "trackid_recognition_{}_{}",
            name,
            std::process::id()
        ));
        std::fs::write(&path, b"RIFF fake wav bytes").unwrap();
        UploadedAudio {
            path,
            original_filename: "clip.wav".to_string(),
            content_type: "audio/wav".to_string(),
        }
    }

    const TRACK_BODY: &str = r#"{"track": {"title": "Test Track", "subtitle": "Test Artist", "images": {"coverart": "https://img.example/c.jpg"}}}"#;

    #[tokio::test]
    async fn test_identify_rotates_to_next_key_on_quota() {
        let (addr, handle) =
            spawn_upstream(vec![(405, r#"{"message": "quota"}"#), (200, TRACK_BODY)]).await;
        let client = client_for(addr, "first,second");
        let audio = sample_upload("rotate");

        let result = client.identify(&audio).await.unwrap();
        assert_eq!(
            result,
            TrackResult::identified(
                "Test Track".to_string(),
                "Test Artist".to_string(),
                Some("https://img.example/c.jpg".to_string())
            )
        );
        assert_eq!(handle.await.unwrap(), 2);

        std::fs::remove_file(&audio.path).ok();
    }

    #[tokio::test]
    async fn test_identify_surfaces_final_quota_error() {
        let (addr, handle) = spawn_upstream(vec![
            (405, r#"{"message": "quota one"}"#),
            (405, r#"{"message": "quota two"}"#),
        ])
        .await;
        let client = client_for(addr, "first,second");
        let audio = sample_upload("exhausted");

        let err = client.identify(&audio).await.unwrap_err();
        match err {
            RecognitionError::Upstream { status, message } => {
                assert_eq!(status, 405);
                assert!(message.contains("quota two"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // One attempt per key, never beyond the pool
        assert_eq!(handle.await.unwrap(), 2);

        std::fs::remove_file(&audio.path).ok();
    }

    #[tokio::test]
    async fn test_identify_does_not_retry_other_errors() {
        let (addr, handle) = spawn_upstream(vec![(500, r#"{"message": "boom"}"#)]).await;
        let client = client_for(addr, "first,second");
        let audio = sample_upload("server_error");

        let err = client.identify(&audio).await.unwrap_err();
        match err {
            RecognitionError::Upstream { status, .. } => assert_eq!(status, 500),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(handle.await.unwrap(), 1);

        std::fs::remove_file(&audio.path).ok();
    }

    #[tokio::test]
    async fn test_identify_maps_empty_payload_to_unidentified() {
        let (addr, handle) = spawn_upstream(vec![(200, "{}")]).await;
        let client = client_for(addr, "only");
        let audio = sample_upload("no_match");

        let result = client.identify(&audio).await.unwrap();
        assert_eq!(result, TrackResult::unidentified());
        assert_eq!(handle.await.unwrap(), 1);

        std::fs::remove_file(&audio.path).ok();
    }

    #[tokio::test]
    async fn test_identify_without_keys_fails_before_any_request() {
        let client = RecognitionClient::new(&RecognitionConfig {
            endpoint: "http://127.0.0.1:9/unused".to_string(),
            api_host: "shazam-core.p.rapidapi.com".to_string(),
            api_keys: String::new(),
        });
        let audio = sample_upload("no_keys");

        let err = client.identify(&audio).await.unwrap_err();
        assert!(matches!(err, RecognitionError::NoKeys));

        std::fs::remove_file(&audio.path).ok();
    }
}
