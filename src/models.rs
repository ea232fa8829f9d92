// TrackID API data models
//
// This module contains the data models used for the TrackID API.
// It includes request and response types used across the API.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Message returned when the recognition service finds no match
pub const UNIDENTIFIED_MESSAGE: &str = "We couldn't identify this track, please try again";

/// Outcome of a recognition request
///
/// Serializes to either `{"identified": true, "title", "artist", "coverart"}`
/// or `{"identified": false, "message"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TrackResult {
    /// The service matched the sample to a known track
    Identified {
        identified: bool,
        title: String,
        artist: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        coverart: Option<String>,
    },
    /// No match was found for the sample
    Unidentified { identified: bool, message: String },
}

impl TrackResult {
    /// Build a successful identification result
    pub fn identified(title: String, artist: String, coverart: Option<String>) -> Self {
        TrackResult::Identified {
            identified: true,
            title,
            artist,
            coverart,
        }
    }

    /// Build the no-match result with the user-facing message
    pub fn unidentified() -> Self {
        TrackResult::Unidentified {
            identified: false,
            message: UNIDENTIFIED_MESSAGE.to_string(),
        }
    }
}

/// Request body for the stream resolution endpoint
#[derive(Debug, Deserialize)]
pub struct RadioRequest {
    /// SoundCloud page URL to resolve
    #[serde(rename = "radioURL")]
    pub radio_url: String,
}

/// Error response for API
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub message: String,
}

/// An uploaded audio clip persisted under the temp directory
#[derive(Debug, Clone)]
pub struct UploadedAudio {
    /// Path of the stored file
    pub path: PathBuf,
    /// Filename sent by the client
    pub original_filename: String,
    /// Content type sent by the client
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identified_serialization() {
        let result = TrackResult::identified(
            "Blinding Lights".to_string(),
            "The Weeknd".to_string(),
            Some("https://images.example/coverart.jpg".to_string()),
        );

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "identified": true,
                "title": "Blinding Lights",
                "artist": "The Weeknd",
                "coverart": "https://images.example/coverart.jpg"
            })
        );
    }

    #[test]
    fn test_identified_without_coverart_omits_field() {
        let result = TrackResult::identified("Song".to_string(), "Artist".to_string(), None);
        let value = serde_json::to_value(&result).unwrap();

        assert!(value.get("coverart").is_none());
        assert_eq!(value["identified"], json!(true));
    }

    #[test]
    fn test_unidentified_serialization() {
        assert_eq!(
            serde_json::to_value(TrackResult::unidentified()).unwrap(),
            json!({
                "identified": false,
                "message": UNIDENTIFIED_MESSAGE
            })
        );
    }

    #[test]
    fn test_radio_request_field_name() {
        let request: RadioRequest =
            serde_json::from_str(r#"{"radioURL": "https://soundcloud.com/artist/track"}"#).unwrap();
        assert_eq!(request.radio_url, "https://soundcloud.com/artist/track");
    }
}
