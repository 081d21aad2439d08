//! # Configuration Settings
//!
//! Defines the configuration structure for the route classifier.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Environment variable prefix shared by every setting
pub const ENV_PREFIX: &str = "ROUTE_CLASSIFIER_";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// HTTP server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Classification configuration
    #[validate(nested)]
    pub classifier: ClassifierConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Build configuration from `ROUTE_CLASSIFIER_*` environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            server: ServerConfig::from_env()?,
            classifier: ClassifierConfig::from_env(),
            observability: ObservabilityConfig::from_env(),
        };
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        if !self.classifier.script_name.is_empty() && !self.classifier.script_name.starts_with('/')
        {
            return Err(Error::validation_field(
                "Script name must be empty or start with '/'",
                "script_name",
            ));
        }

        if self.classifier.script_name.ends_with('/') {
            return Err(Error::validation_field(
                "Script name must not end with '/'",
                "script_name",
            ));
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Maximum request body size in bytes buffered for classification
    #[validate(range(min = 1024, message = "Max body size must be at least 1KB"))]
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080, max_body_size: 1024 * 1024 }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match env_var("PORT") {
            Some(value) => value
                .parse()
                .map_err(|e| Error::config(format!("Invalid server port '{}': {}", value, e)))?,
            None => defaults.port,
        };

        let max_body_size = match env_var("MAX_BODY_SIZE") {
            Some(value) => value
                .parse()
                .map_err(|e| Error::config(format!("Invalid max body size '{}': {}", value, e)))?,
            None => defaults.max_body_size,
        };

        Ok(Self { host: env_var("HOST").unwrap_or(defaults.host), port, max_body_size })
    }
}

/// Settings for the classification stage itself
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClassifierConfig {
    /// The JSON file that defines the action/resource mapping
    #[validate(length(min = 1, message = "Mapping file cannot be empty"))]
    pub mapping_file: String,

    /// Directories searched for relative file names, in order
    pub config_dirs: Vec<PathBuf>,

    /// Route table document (YAML or JSON)
    #[validate(length(min = 1, message = "Routes file cannot be empty"))]
    pub routes_file: String,

    /// Mount prefix preceding every routed path
    pub script_name: String,

    /// Route action marker signalling that the operation name lives in the body
    #[validate(length(min = 1, message = "Action sentinel cannot be empty"))]
    pub action_sentinel: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            mapping_file: "mapping.json".to_string(),
            config_dirs: vec![PathBuf::from("."), PathBuf::from("/etc/route-classifier")],
            routes_file: "routes.yaml".to_string(),
            script_name: String::new(),
            action_sentinel: "action".to_string(),
        }
    }
}

impl ClassifierConfig {
    fn from_env() -> Self {
        let defaults = Self::default();

        let config_dirs = env_var("CONFIG_DIRS")
            .map(|dirs| {
                dirs.split(':').filter(|d| !d.is_empty()).map(PathBuf::from).collect::<Vec<_>>()
            })
            .unwrap_or(defaults.config_dirs);

        Self {
            mapping_file: env_var("MAPPING_FILE").unwrap_or(defaults.mapping_file),
            config_dirs,
            routes_file: env_var("ROUTES_FILE").unwrap_or(defaults.routes_file),
            script_name: env_var("SCRIPT_NAME").unwrap_or(defaults.script_name),
            action_sentinel: env_var("ACTION_SENTINEL").unwrap_or(defaults.action_sentinel),
        }
    }

    /// Resolve the mapping file against the configured search directories
    pub fn mapping_path(&self) -> Result<PathBuf> {
        find_file(&self.mapping_file, &self.config_dirs)
    }

    /// Resolve the routes file against the configured search directories
    pub fn routes_path(&self) -> Result<PathBuf> {
        find_file(&self.routes_file, &self.config_dirs)
    }
}

/// Locate `name` in `dirs`, returning the first candidate that exists.
///
/// Absolute paths are returned untouched so operators can pin a file outside
/// the search list.
pub fn find_file(name: &str, dirs: &[PathBuf]) -> Result<PathBuf> {
    let path = Path::new(name);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    dirs.iter().map(|dir| dir.join(path)).find(|candidate| candidate.is_file()).ok_or_else(|| {
        Error::config(format!(
            "{} not found in any of [{}]",
            name,
            dirs.iter().map(|d| d.display().to_string()).collect::<Vec<_>>().join(", ")
        ))
    })
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Service name attached to startup logs
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "route-classifier".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    /// Create ObservabilityConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: env_var("SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: env_var("LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logging: env_var("JSON_LOGGING")
                .map(|s| s.to_lowercase() == "true" || s == "1")
                .unwrap_or(defaults.json_logging),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, name)).ok().filter(|value| !value.is_empty())
}
