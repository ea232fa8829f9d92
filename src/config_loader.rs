// Configuration loader for TrackID API
//
// This module handles loading configuration from the TOML configuration file
// and environment variables with appropriate precedence.

use std::env;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use toml::Value;

const CONFIG_FILE_PATH: &str = "trackid_api.conf";

/// Loads configuration from TOML file and environment variables
///
/// Configuration precedence (highest to lowest):
/// 1. Environment variables
/// 2. Configuration file values
/// 3. Default values (not handled here - application defaults)
///
/// Top-level keys map to env vars directly; keys inside a `[section]` table
/// are prefixed with the section name (`[server] port` becomes `SERVER_PORT`).
///
/// # Returns
///
/// Returns true if the config file was successfully loaded, false otherwise
pub fn load_config() -> bool {
    let config_path = Path::new(CONFIG_FILE_PATH);

    if !config_path.exists() {
        debug!("Configuration file not found at: {}", CONFIG_FILE_PATH);
        return false;
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read configuration file: {}", e);
            return false;
        }
    };

    let config_values: Value = match config_content.parse() {
        Ok(values) => values,
        Err(e) => {
            warn!("Failed to parse configuration file: {}", e);
            return false;
        }
    };

    for (key, value) in flatten_config(&config_values) {
        // Only set if the environment variable doesn't already exist
        if env::var(&key).is_err() {
            debug!("Setting env var from config file: {} = {}", key, value);
            env::set_var(key, value);
        } else {
            debug!("Env var already exists, skipping: {}", key);
        }
    }

    info!("Configuration loaded from {}", CONFIG_FILE_PATH);
    true
}

/// Flatten a parsed TOML document into env-var style key/value pairs
fn flatten_config(config: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    if let Value::Table(table) = config {
        for (key, value) in table {
            match value {
                Value::Table(section) => {
                    for (inner_key, inner_value) in section {
                        match scalar_to_string(inner_value) {
                            Some(s) => {
                                pairs.push((format!("{}_{}", upper(key), upper(inner_key)), s))
                            }
                            None => warn!(
                                "Skipping unsupported TOML value type for key: {}.{}",
                                key, inner_key
                            ),
                        }
                    }
                }
                other => match scalar_to_string(other) {
                    Some(s) => pairs.push((upper(key), s)),
                    None => warn!("Skipping unsupported TOML value type for key: {}", key),
                },
            }
        }
    }

    pairs
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

fn upper(key: &str) -> String {
    key.to_uppercase().replace('-', "_")
}
