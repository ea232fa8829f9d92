// API route handlers for TrackID API
//
// This module contains the route handlers for the TrackID API.
// It implements the actual HTTP endpoints for the API.

use crate::config::HandlerConfig;
use crate::error::HandlerError;
use crate::file_utils::TempUpload;
use crate::handlers::form::extract_audio_file;
use crate::models::{ErrorResponse, RadioRequest};
use crate::recognition::RecognitionClient;
use crate::soundcloud::SoundCloudClient;
use actix_multipart::Multipart;
use actix_web::{options, post, web, HttpRequest, HttpResponse};
use log::info;

/// Handler for track recognition requests
///
/// This endpoint receives an audio clip as a multipart upload, stores it
/// transiently and forwards it to the recognition service. The stored file is
/// removed once the round trip concludes, whatever the outcome.
#[post("/shazam")]
pub async fn recognize(
    form: Multipart,
    recognition: web::Data<RecognitionClient>,
    config: web::Data<HandlerConfig>,
) -> Result<HttpResponse, HandlerError> {
    let audio = extract_audio_file(form, &config).await?;

    // Removed on drop, so success, no-match and error paths all clean up once
    let upload = TempUpload::new(audio.path.clone());

    let result = recognition.identify(&audio).await?;
    info!(
        "Recognition request for {} completed",
        upload.path().display()
    );

    Ok(HttpResponse::Ok().json(result))
}

/// Handler for stream resolution requests
///
/// This endpoint resolves the playable stream URL behind a SoundCloud page URL
/// and returns it as plain text.
#[post("/soundcloud")]
pub async fn resolve_stream(
    body: web::Json<RadioRequest>,
    soundcloud: web::Data<SoundCloudClient>,
) -> Result<HttpResponse, HandlerError> {
    let stream_url = soundcloud.resolve_stream(&body.radio_url).await?;
    info!("Resolved stream URL for {}", body.radio_url);

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(stream_url))
}

/// Handler for OPTIONS requests to the recognition endpoint
#[options("/shazam")]
pub async fn recognize_options(_req: HttpRequest) -> HttpResponse {
    preflight_response("OPTIONS, POST")
}

/// Handler for OPTIONS requests to the stream resolution endpoint
#[options("/soundcloud")]
pub async fn resolve_stream_options(_req: HttpRequest) -> HttpResponse {
    preflight_response("OPTIONS, POST")
}

fn preflight_response(allowed_methods: &str) -> HttpResponse {
    HttpResponse::Ok()
        .append_header(("Allow", allowed_methods))
        .append_header(("Access-Control-Allow-Methods", allowed_methods))
        .append_header(("Access-Control-Allow-Headers", "Content-Type"))
        .append_header(("Access-Control-Max-Age", "86400")) // Cache preflight for 24 hours
        .finish()
}

/// Default handler for unmatched routes
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        message: "Not Found".to_string(),
    })
}
