//! # Error Handling
//!
//! Error types shared by configuration, file loading and server startup.

pub mod types;

pub use types::{Error, Result};
