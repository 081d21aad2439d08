//! # Route Classifier
//!
//! Request classification stage for an OpenStack-style API gateway. Every
//! inbound request is matched against a route table, generalized into a
//! canonical URL and looked up in a JSON mapping document, producing the
//! ordered list of `{action, resource}` pairs an authorization stage checks.
//!
//! ## Architecture
//!
//! ```text
//! HTTP request → classify_requests middleware → RequestClassifier
//!                                                 ├─ RouteMatcher (route table)
//!                                                 ├─ URL generalizer
//!                                                 ├─ MappingStore (mtime-checked cache)
//!                                                 └─ resolver + resource id extractor
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use route_classifier::{
//!     classifier::InboundRequest, mapping::MappingStore, RequestClassifier, Result, RouteTable,
//! };
//!
//! fn main() -> Result<()> {
//!     let routes = RouteTable::from_file("routes.yaml".as_ref())?;
//!     let classifier = RequestClassifier::new(Arc::new(routes), MappingStore::new("mapping.json"))
//!         .with_script_name("/v2");
//!
//!     let descriptors = classifier.classify(&InboundRequest::new("GET", "/v2/abc123/volumes"));
//!     println!("{:?}", descriptors);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod errors;
pub mod mapping;
pub mod observability;
pub mod routing;

// Re-export commonly used types and traits
pub use classifier::{
    ActionResourceList, ClassificationError, InboundRequest, RequestClassifier, ResourceDescriptor,
};
pub use config::AppConfig;
pub use errors::{Error, Result};
pub use routing::{RouteMatcher, RouteTable};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "route-classifier");
    }
}
