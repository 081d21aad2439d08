//! # Request Classification
//!
//! Turns an inbound request into the list of [`ResourceDescriptor`]s an
//! authorization stage has to check:
//!
//! 1. match the request against the route table
//! 2. generalize the matched template into a canonical URL
//! 3. when the route dispatches to the action sentinel, read the operation
//!    name from the body
//! 4. look the URL, method and operation up in the mapping document
//! 5. build one descriptor per rule, extracting resource ids as required
//!
//! Classification is all-or-nothing: any failure yields a
//! [`ClassificationError`] and no descriptors.

pub mod body;
pub mod descriptor;
pub mod error;
pub mod extract;
pub mod json_path;
pub mod resolver;

use std::sync::Arc;

use tracing::debug;

pub use body::{operation_from_body, LazyBody};
pub use descriptor::{ActionResourceList, ResourceDescriptor};
pub use error::ClassificationError;
pub use extract::ResourceIdExtractor;
pub use json_path::{JsonPath, PathMiss, PathSyntaxError};
pub use resolver::resolve;

use crate::classify_span;
use crate::config::ClassifierConfig;
use crate::errors::Result;
use crate::mapping::MappingStore;
use crate::routing::{generalize, RouteMatcher};

/// The parts of an HTTP request classification looks at.
#[derive(Debug)]
pub struct InboundRequest<'a> {
    pub method: Option<&'a str>,
    /// Full request path, including the mount prefix.
    pub path: Option<&'a str>,
    /// Raw query string without the leading `?`.
    pub query: Option<&'a str>,
    pub body: LazyBody<'a>,
}

impl<'a> InboundRequest<'a> {
    pub fn new(method: &'a str, path: &'a str) -> Self {
        Self { method: Some(method), path: Some(path), query: None, body: LazyBody::empty() }
    }

    pub fn with_query(mut self, query: Option<&'a str>) -> Self {
        self.query = query.filter(|q| !q.is_empty());
        self
    }

    pub fn with_body(mut self, body: LazyBody<'a>) -> Self {
        self.body = body;
        self
    }
}

/// Classifies requests against a route matcher and a mapping document.
pub struct RequestClassifier {
    routes: Arc<dyn RouteMatcher>,
    mappings: MappingStore,
    script_name: String,
    action_sentinel: String,
}

impl RequestClassifier {
    pub fn new(routes: Arc<dyn RouteMatcher>, mappings: MappingStore) -> Self {
        Self { routes, mappings, script_name: String::new(), action_sentinel: "action".to_string() }
    }

    /// Mount prefix stripped before routing and prepended to canonical URLs.
    pub fn with_script_name(mut self, script_name: impl Into<String>) -> Self {
        self.script_name = script_name.into();
        self
    }

    /// Route action marking endpoints whose operation is named in the body.
    pub fn with_action_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.action_sentinel = sentinel.into();
        self
    }

    pub fn from_config(config: &ClassifierConfig, routes: Arc<dyn RouteMatcher>) -> Result<Self> {
        let mappings = MappingStore::new(config.mapping_path()?);
        Ok(Self::new(routes, mappings)
            .with_script_name(config.script_name.clone())
            .with_action_sentinel(config.action_sentinel.clone()))
    }

    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    pub fn mappings(&self) -> &MappingStore {
        &self.mappings
    }

    /// Compute the descriptors for `request`.
    ///
    /// Failures are logged here; service faults at `error` with
    /// `severity = "critical"`, client faults at `warn`.
    pub fn classify(
        &self,
        request: &InboundRequest<'_>,
    ) -> std::result::Result<Vec<ResourceDescriptor>, ClassificationError> {
        let span =
            classify_span!(request.method.unwrap_or_default(), request.path.unwrap_or_default());
        let _enter = span.enter();

        self.classify_inner(request, &span).inspect_err(ClassificationError::log)
    }

    fn classify_inner(
        &self,
        request: &InboundRequest<'_>,
        span: &tracing::Span,
    ) -> std::result::Result<Vec<ResourceDescriptor>, ClassificationError> {
        let method = request.method.filter(|m| !m.is_empty());
        let path = request.path.filter(|p| !p.is_empty());
        let (Some(method), Some(path)) = (method, path) else {
            return Err(ClassificationError::MissingRequestLine);
        };

        let no_route = || ClassificationError::NoRouteMatch {
            method: method.to_string(),
            path: path.to_string(),
        };

        let routed_path = self.strip_script_name(path).ok_or_else(no_route)?;
        let route = self.routes.route_match(method, routed_path).ok_or_else(no_route)?;

        let url = generalize(&self.script_name, &route);
        span.record("canonical_url", url.as_str());

        let operation = if route.action.as_deref() == Some(self.action_sentinel.as_str()) {
            let operation = operation_from_body(&request.body)?;
            debug!(operation = %operation, "Operation named in body");
            Some(operation)
        } else {
            None
        };

        let document = self.mappings.document()?;
        let extractor = ResourceIdExtractor::new(&route, &request.body, request.query);
        let descriptors = resolve(&document, &url, method, operation.as_deref(), &extractor)?;

        debug!(count = descriptors.len(), "Request classified");
        Ok(descriptors)
    }

    /// Path below the mount prefix; `None` when outside it or at its root.
    fn strip_script_name<'p>(&self, path: &'p str) -> Option<&'p str> {
        let rest = path.strip_prefix(self.script_name.as_str())?;
        (rest.starts_with('/') && rest.len() > 1).then_some(rest)
    }
}

impl std::fmt::Debug for RequestClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestClassifier")
            .field("mappings", &self.mappings)
            .field("script_name", &self.script_name)
            .field("action_sentinel", &self.action_sentinel)
            .finish_non_exhaustive()
    }
}
