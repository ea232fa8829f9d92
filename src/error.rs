// Error handling for TrackID API
//
// This module defines error types and handling for the TrackID API.
// It centralizes error definitions and provides helpful conversion traits.

use std::io;
use std::path::Path;
use thiserror::Error;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::models::ErrorResponse;

/// Errors that can occur in the TrackID API handlers
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Error when processing multipart form data or a JSON body
    #[error("Form error: {0}")]
    FormError(String),

    /// Error when saving file data
    #[error("File error: {0}")]
    FileError(#[from] io::Error),

    /// Error when no audio file was provided
    #[error("No audio file provided in the request")]
    NoAudioFile,

    /// Error when the submitted radio URL is not a SoundCloud track URL
    #[error("Invalid radio URL: {0}")]
    InvalidRadioUrl(String),

    /// Error reported by or while reaching an external service
    ///
    /// Carries the upstream HTTP status when one was received; transport
    /// failures carry no status and map to 500.
    #[error("{message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },
}

impl HandlerError {
    /// Create a new FormError
    pub fn form_error<S: Into<String>>(msg: S) -> Self {
        Self::FormError(msg.into())
    }

    /// Helper to clean up a stored upload when an error occurs
    pub fn with_cleanup(self, file_path: Option<&Path>) -> Self {
        if let Some(file_path) = file_path {
            crate::file_utils::cleanup_file(file_path);
        }
        self
    }
}

impl ResponseError for HandlerError {
    fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::FormError(_)
            | HandlerError::NoAudioFile
            | HandlerError::InvalidRadioUrl(_) => StatusCode::BAD_REQUEST,
            HandlerError::FileError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HandlerError::Upstream { status, .. } => status
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            message: self.to_string(),
        })
    }
}

/// Convert RecognitionError to HandlerError
impl From<crate::recognition::RecognitionError> for HandlerError {
    fn from(err: crate::recognition::RecognitionError) -> Self {
        use crate::recognition::RecognitionError;

        match err {
            RecognitionError::Upstream { status, message } => HandlerError::Upstream {
                status: Some(status),
                message,
            },
            RecognitionError::Io(e) => HandlerError::FileError(e),
            other => HandlerError::Upstream {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

/// Convert ScrapeError to HandlerError
impl From<crate::soundcloud::ScrapeError> for HandlerError {
    fn from(err: crate::soundcloud::ScrapeError) -> Self {
        use crate::soundcloud::ScrapeError;

        match err {
            ScrapeError::InvalidUrl(url) => HandlerError::InvalidRadioUrl(url),
            ScrapeError::Upstream { status, message } => HandlerError::Upstream {
                status: Some(status),
                message,
            },
            other => HandlerError::Upstream {
                status: None,
                message: other.to_string(),
            },
        }
    }
}
