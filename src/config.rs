// TrackID API configuration
//
// This module contains configuration structures and constants for the TrackID API.
// It centralizes all configuration parameters and provides defaults from environment variables.

use std::env;

/// Default values for configuration
pub mod defaults {
    // Temporary directory for uploaded audio clips
    pub const TEMP_DIR: &str = "./tmp";

    // Allowed cross-origin value sent back to browser clients
    pub const ALLOWED_ORIGIN: &str = "*";

    // Recognition service endpoint and the host header it expects
    pub const RECOGNITION_ENDPOINT: &str =
        "https://shazam-core.p.rapidapi.com/v1/tracks/recognize";
    pub const RECOGNITION_HOST: &str = "shazam-core.p.rapidapi.com";

    // Content type attached to outbound audio samples
    pub const UPLOAD_MIME: &str = "audio/wav";
}

/// Configuration for the TrackID API handlers
#[derive(Clone, Debug)]
pub struct HandlerConfig {
    /// Directory to store temporary upload files
    pub temp_dir: String,
    /// Value for the Access-Control-Allow-Origin response header
    pub allowed_origin: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            temp_dir: env::var("TRACKID_TMP_FILES")
                .unwrap_or_else(|_| String::from(defaults::TEMP_DIR)),
            allowed_origin: env::var("ORIGIN")
                .unwrap_or_else(|_| String::from(defaults::ALLOWED_ORIGIN)),
        }
    }
}

impl HandlerConfig {
    /// Ensures the temporary directory exists
    pub fn ensure_temp_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.temp_dir)
    }
}

/// Configuration for the recognition service client
#[derive(Clone, Debug)]
pub struct RecognitionConfig {
    /// URL of the recognition endpoint
    pub endpoint: String,
    /// Value for the x-rapidapi-host request header
    pub api_host: String,
    /// Comma-separated credential list for the recognition service
    pub api_keys: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: env::var("SHAZAM_API_URL")
                .unwrap_or_else(|_| String::from(defaults::RECOGNITION_ENDPOINT)),
            api_host: env::var("SHAZAM_API_HOST")
                .unwrap_or_else(|_| String::from(defaults::RECOGNITION_HOST)),
            api_keys: env::var("RAPIDAPI_KEY").unwrap_or_default(),
        }
    }
}
