//! # Observability Infrastructure
//!
//! Structured logging for the route classifier.

pub mod logging;

pub use logging::{init_logging, log_config_info};
