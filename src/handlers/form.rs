// Form data processing for TrackID API
//
// This module handles the extraction of the uploaded audio clip from the
// multipart request body. The clip is buffered and persisted under the
// configured temp directory; its original filename and content type are kept
// for the recognition stage.

use actix_multipart::Multipart;
use futures::{StreamExt, TryStreamExt};
use log::{error, info};

use crate::config::HandlerConfig;
use crate::error::HandlerError;
use crate::file_utils::{generate_upload_path, save_file_data};
use crate::models::UploadedAudio;

/// Extract and persist the audio file from a multipart upload
///
/// # Arguments
///
/// * `form` - The multipart form from the HTTP request
/// * `config` - Handler configuration
///
/// # Returns
///
/// * `Result<UploadedAudio, HandlerError>` - The stored upload, or an error.
///   Fails with `NoAudioFile` when the form carries no `file` field, before
///   any outbound call is made.
pub async fn extract_audio_file(
    mut form: Multipart,
    config: &HandlerConfig,
) -> Result<UploadedAudio, HandlerError> {
    let mut uploaded: Option<UploadedAudio> = None;

    // Ensure the temp directory exists
    config.ensure_temp_dir().map_err(|e| {
        error!("Failed to create temp directory: {}", e);
        HandlerError::FileError(e)
    })?;

    // Process form data
    while let Ok(Some(mut field)) = form.try_next().await {
        let content_disposition = field.content_disposition();
        let field_name = content_disposition
            .and_then(|cd| cd.get_name().map(|name| name.to_string()))
            .unwrap_or_default();

        match field_name.as_str() {
            "file" if uploaded.is_none() => {
                let original_filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|name| name.to_string()))
                    .unwrap_or_else(|| String::from("unknown"));
                let content_type = field
                    .content_type()
                    .map(|mime| mime.to_string())
                    .unwrap_or_else(|| String::from("application/octet-stream"));

                let path = generate_upload_path(&config.temp_dir).map_err(|e| {
                    error!("Failed to create upload path: {}", e);
                    HandlerError::FileError(e)
                })?;

                // Buffer the field, then persist it in one write
                let mut file_data = Vec::new();
                while let Some(chunk) = field.next().await {
                    let data = chunk.map_err(|e| {
                        HandlerError::form_error(format!("Error processing file upload: {}", e))
                    })?;
                    file_data.extend_from_slice(&data);
                }

                save_file_data(&file_data, &path)
                    .map_err(|e| HandlerError::FileError(e).with_cleanup(Some(&path)))?;

                info!(
                    "Saved upload {} ({}, {} bytes) to {}",
                    original_filename,
                    content_type,
                    file_data.len(),
                    path.display()
                );

                uploaded = Some(UploadedAudio {
                    path,
                    original_filename,
                    content_type,
                });
            }
            _ => {
                // Skip unknown fields and any extra file fields
                while let Some(_) = field.next().await {}
            }
        }
    }

    uploaded.ok_or(HandlerError::NoAudioFile)
}
