//! # Configuration Management
//!
//! Environment-driven configuration for the route classifier service.

pub mod settings;

pub use settings::{
    find_file, AppConfig, ClassifierConfig, ObservabilityConfig, ServerConfig, ENV_PREFIX,
};
