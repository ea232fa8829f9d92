// Configuration validation module for TrackID API
//
// This module validates the environment-backed configuration parameters at
// startup, so misconfiguration is reported early with actionable messages.
// The validation is schema-driven: a centralized registry defines the type
// and severity of every parameter the service reads.

use std::env;
use std::net::IpAddr;

use log::{error, info, warn};

/// Configuration parameter types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigType {
    String,
    UnsignedInteger,
    Port,
    IpAddress,
    Url,
    CommaSeparatedList,
}

/// Validation severity levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationLevel {
    Critical, // Must be valid for the application to start
    Warning,  // Generates warnings only
}

/// Configuration parameter definition
#[derive(Debug, Clone)]
pub struct ConfigParam {
    pub name: &'static str,
    pub description: &'static str,
    pub param_type: ConfigType,
    pub level: ValidationLevel,
}

/// Centralized registry of every parameter the service reads
pub const CONFIG_PARAMS: &[ConfigParam] = &[
    ConfigParam {
        name: "TRACKID_API_HOST",
        description: "Host IP address for the API server",
        param_type: ConfigType::IpAddress,
        level: ValidationLevel::Critical,
    },
    ConfigParam {
        name: "PORT",
        description: "Port for the API server",
        param_type: ConfigType::Port,
        level: ValidationLevel::Critical,
    },
    ConfigParam {
        name: "HTTP_WORKER_NUMBER",
        description: "Number of HTTP worker processes (0 = use CPU cores)",
        param_type: ConfigType::UnsignedInteger,
        level: ValidationLevel::Warning,
    },
    ConfigParam {
        name: "TRACKID_TMP_FILES",
        description: "Directory for temporary upload files",
        param_type: ConfigType::String,
        level: ValidationLevel::Warning,
    },
    ConfigParam {
        name: "ORIGIN",
        description: "Allowed cross-origin value for browser clients",
        param_type: ConfigType::String,
        level: ValidationLevel::Warning,
    },
    ConfigParam {
        name: "RAPIDAPI_KEY",
        description: "Comma-separated credential list for the recognition service",
        param_type: ConfigType::CommaSeparatedList,
        level: ValidationLevel::Warning,
    },
    ConfigParam {
        name: "SHAZAM_API_URL",
        description: "URL of the recognition endpoint",
        param_type: ConfigType::Url,
        level: ValidationLevel::Critical,
    },
    ConfigParam {
        name: "SHAZAM_API_HOST",
        description: "Host header expected by the recognition endpoint",
        param_type: ConfigType::String,
        level: ValidationLevel::Warning,
    },
];

/// A single validation failure
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
    pub value: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Configuration error in '{}': {} (value: '{}')",
            self.field, self.message, self.value
        )
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validation results
#[derive(Debug, Default)]
pub struct ValidationResults {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ConfigValidationError) {
        self.warnings.push(warning);
    }

    pub fn print_summary(&self) {
        if !self.errors.is_empty() {
            error!(
                "Configuration validation found {} error(s):",
                self.errors.len()
            );
            for (i, err) in self.errors.iter().enumerate() {
                error!("  {}. {}", i + 1, err);
            }
        }

        if !self.warnings.is_empty() {
            warn!(
                "Configuration validation found {} warning(s):",
                self.warnings.len()
            );
            for (i, warning) in self.warnings.iter().enumerate() {
                warn!("  {}. {}", i + 1, warning);
            }
        }

        if self.is_valid() && self.warnings.is_empty() {
            info!("Configuration validation passed successfully");
        } else if self.is_valid() {
            info!(
                "Configuration validation passed with {} warning(s)",
                self.warnings.len()
            );
        }
    }
}

/// Validate a single value against a parameter type
pub fn validate_value(param_type: ConfigType, value: &str) -> Result<(), String> {
    match param_type {
        ConfigType::String => {
            if value.trim().is_empty() {
                Err("value must not be empty".to_string())
            } else {
                Ok(())
            }
        }
        ConfigType::UnsignedInteger => value
            .parse::<u64>()
            .map(|_| ())
            .map_err(|_| "value must be a non-negative integer".to_string()),
        ConfigType::Port => value
            .parse::<u16>()
            .map(|_| ())
            .map_err(|_| "value must be a port number (0-65535)".to_string()),
        ConfigType::IpAddress => value
            .parse::<IpAddr>()
            .map(|_| ())
            .map_err(|_| "value must be an IP address".to_string()),
        ConfigType::Url => value
            .parse::<reqwest::Url>()
            .map(|_| ())
            .map_err(|_| "value must be an absolute URL".to_string()),
        ConfigType::CommaSeparatedList => {
            if value.split(',').any(|item| !item.trim().is_empty()) {
                Ok(())
            } else {
                Err("value must contain at least one non-empty entry".to_string())
            }
        }
    }
}

/// Validate every registered parameter present in the environment
///
/// Missing parameters fall back to application defaults and are not reported,
/// except RAPIDAPI_KEY: without credentials the recognition endpoint cannot
/// serve a single request, so its absence is surfaced as a warning.
pub fn validate_startup_config() -> ValidationResults {
    let mut results = ValidationResults::new();

    for param in CONFIG_PARAMS {
        match env::var(param.name) {
            Ok(value) => {
                if let Err(message) = validate_value(param.param_type, &value) {
                    let failure = ConfigValidationError {
                        field: param.name.to_string(),
                        message: format!("{} - {}", param.description, message),
                        value,
                    };
                    match param.level {
                        ValidationLevel::Critical => results.add_error(failure),
                        ValidationLevel::Warning => results.add_warning(failure),
                    }
                }
            }
            Err(_) => {
                if param.name == "RAPIDAPI_KEY" {
                    results.add_warning(ConfigValidationError {
                        field: param.name.to_string(),
                        message: "not set; /shazam requests will fail until it is configured"
                            .to_string(),
                        value: String::new(),
                    });
                }
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_port() {
        assert!(validate_value(ConfigType::Port, "3000").is_ok());
        assert!(validate_value(ConfigType::Port, "0").is_ok());
        assert!(validate_value(ConfigType::Port, "65536").is_err());
        assert!(validate_value(ConfigType::Port, "http").is_err());
    }

    #[test]
    fn test_validate_ip_address() {
        assert!(validate_value(ConfigType::IpAddress, "0.0.0.0").is_ok());
        assert!(validate_value(ConfigType::IpAddress, "::1").is_ok());
        assert!(validate_value(ConfigType::IpAddress, "localhost").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_value(
            ConfigType::Url,
            "https://shazam-core.p.rapidapi.com/v1/tracks/recognize"
        )
        .is_ok());
        assert!(validate_value(ConfigType::Url, "not a url").is_err());
    }

    #[test]
    fn test_validate_unsigned_integer() {
        assert!(validate_value(ConfigType::UnsignedInteger, "0").is_ok());
        assert!(validate_value(ConfigType::UnsignedInteger, "16").is_ok());
        assert!(validate_value(ConfigType::UnsignedInteger, "-1").is_err());
    }

    #[test]
    fn test_validate_comma_separated_list() {
        assert!(validate_value(ConfigType::CommaSeparatedList, "key1,key2").is_ok());
        assert!(validate_value(ConfigType::CommaSeparatedList, "key1").is_ok());
        assert!(validate_value(ConfigType::CommaSeparatedList, " , ").is_err());
        assert!(validate_value(ConfigType::CommaSeparatedList, "").is_err());
    }

    #[test]
    fn test_validate_string() {
        assert!(validate_value(ConfigType::String, "./tmp").is_ok());
        assert!(validate_value(ConfigType::String, "  ").is_err());
    }
}
