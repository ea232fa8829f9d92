use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};

use trackid_api::config::{HandlerConfig, RecognitionConfig};
use trackid_api::config_loader;
use trackid_api::config_validator;
use trackid_api::handlers::{
    not_found, recognize, recognize_options, resolve_stream, resolve_stream_options, Cors,
};
use trackid_api::recognition::RecognitionClient;
use trackid_api::soundcloud::SoundCloudClient;
use trackid_api::HandlerError;

const DEFAULT_TRACKID_API_HOST: &str = "0.0.0.0";
const DEFAULT_TRACKID_API_PORT: &str = "3000";

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Load configuration file values into the environment (env vars win)
    config_loader::load_config();

    // Validate configuration before anything starts
    let validation = config_validator::validate_startup_config();
    validation.print_summary();
    if !validation.is_valid() {
        std::process::exit(1);
    }

    let handler_config = HandlerConfig::default();
    let recognition_config = RecognitionConfig::default();

    // Create tmp directory if it doesn't exist
    if let Err(e) = handler_config.ensure_temp_dir() {
        warn!(
            "Failed to create temp directory {}: {}",
            handler_config.temp_dir, e
        );
    }

    let recognition = web::Data::new(RecognitionClient::new(&recognition_config));
    let soundcloud = web::Data::new(SoundCloudClient::new());

    // Server settings
    let host = std::env::var("TRACKID_API_HOST")
        .unwrap_or_else(|_| DEFAULT_TRACKID_API_HOST.to_string());
    let port =
        std::env::var("PORT").unwrap_or_else(|_| DEFAULT_TRACKID_API_PORT.to_string());
    let workers = std::env::var("HTTP_WORKER_NUMBER")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or_else(num_cpus::get);

    info!("Starting TrackID API server on http://{}:{}", host, port);
    info!("Using temp directory: {}", handler_config.temp_dir);
    info!("Recognition endpoint: {}", recognition_config.endpoint);
    info!("Loaded {} recognition API key(s)", recognition.key_count());
    info!("Allowed origin: {}", handler_config.allowed_origin);

    let allowed_origin = handler_config.allowed_origin.clone();
    let handler_config = web::Data::new(handler_config);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::new(&allowed_origin))
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "SAMEORIGIN"))
                    .add(("Referrer-Policy", "no-referrer")),
            )
            .app_data(handler_config.clone())
            .app_data(recognition.clone())
            .app_data(soundcloud.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                HandlerError::form_error(err.to_string()).into()
            }))
            .service(recognize)
            .service(resolve_stream)
            .service(recognize_options)
            .service(resolve_stream_options)
            .default_service(web::route().to(not_found))
    })
    .bind(format!("{}:{}", host, port))?
    .workers(workers)
    .run()
    .await
}
