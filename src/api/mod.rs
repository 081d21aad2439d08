//! # HTTP Surface
//!
//! Axum middleware that classifies requests, the plain-text rejection it
//! answers with, and a standalone server exposing the classification result.

pub mod error;
pub mod middleware;
pub mod server;

pub use error::ClassificationRejection;
pub use middleware::{classify_requests, ClassifierState};
pub use server::{build_router, start_server};
