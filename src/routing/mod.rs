//! Route matching and URL generalization.
//!
//! The router proper is a collaborator of the classifier: anything that can
//! turn a method and path into a [`RouteMatch`] plugs in through
//! [`RouteMatcher`]. [`RouteTable`] is the template-based implementation the
//! service ships with.

pub mod generalize;
pub mod table;

use std::collections::HashMap;

pub use generalize::{generalize, resource_id_key, CanonicalUrl};
pub use table::{RouteSpec, RouteTable};

/// Placeholder naming the owning tenant in canonical URLs and resource formats.
pub const TENANT_KEY: &str = "tenant_id";
/// Placeholder routes use for the project capture.
pub const PROJECT_KEY: &str = "project_id";
/// Placeholder for the resource type inside a resource format.
pub const RESOURCE_TYPE_KEY: &str = "resourceType";
/// Generic identifier segment emitted by resource-style route templates.
pub const ID_KEY: &str = ":(id)";
/// Suffix appended to a member name to build its identifier placeholder.
pub const ID_SUFFIX: &str = "_id";

/// Result of matching an inbound request against the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub method: String,
    pub path: String,
    /// Captured path parameters keyed by placeholder name.
    pub params: HashMap<String, String>,
    /// The template the path matched, e.g. `/{project_id}/volumes/:(id)`.
    pub route_path: String,
    /// Singular name of the resource group, e.g. `volume` for `/volumes`.
    pub member_name: Option<String>,
    /// Controller action the route dispatches to.
    pub action: Option<String>,
}

impl RouteMatch {
    /// Captured value for `name`, ignoring empty captures.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str).filter(|value| !value.is_empty())
    }

    /// The tenant the request is scoped to.
    pub fn tenant_id(&self) -> Option<&str> {
        self.param(PROJECT_KEY)
    }
}

/// Resolves an inbound method and path to a route.
pub trait RouteMatcher: Send + Sync {
    /// Returns `None` when no route accepts the request.
    fn route_match(&self, method: &str, path: &str) -> Option<RouteMatch>;
}
