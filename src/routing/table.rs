//! Template-based route table.
//!
//! Templates are `/`-separated; a segment is either a literal or a capture
//! written as `{name}`, `:(name)` or `:name`. A path matches a template when
//! both have the same number of segments, literals are equal and every
//! capture consumes a non-empty segment. The first matching route wins.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{RouteMatch, RouteMatcher};
use crate::errors::{Error, Result};

/// Declarative description of one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// Path template, e.g. `/{project_id}/volumes/:(id)`.
    pub template: String,
    /// Accepted methods; empty accepts every method.
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub member_name: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouteTableFile {
    routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
}

impl Segment {
    fn parse(raw: &str) -> Option<Self> {
        let capture = raw
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .or_else(|| raw.strip_prefix(":(").and_then(|rest| rest.strip_suffix(')')))
            .or_else(|| raw.strip_prefix(':'));

        match capture {
            Some("") => None,
            Some(name) => Some(Segment::Capture(name.to_string())),
            None => Some(Segment::Literal(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    spec: RouteSpec,
    segments: Vec<Segment>,
}

impl CompiledRoute {
    fn compile(spec: RouteSpec) -> Result<Self> {
        if !spec.template.starts_with('/') {
            return Err(Error::validation_field(
                format!("route template '{}' must start with '/'", spec.template),
                "template",
            ));
        }

        let segments = spec
            .template
            .split('/')
            .skip(1)
            .map(|raw| {
                Segment::parse(raw).ok_or_else(|| {
                    Error::validation_field(
                        format!("route template '{}' has an unnamed capture", spec.template),
                        "template",
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { spec, segments })
    }

    fn accepts_method(&self, method: &str) -> bool {
        self.spec.methods.is_empty()
            || self.spec.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }

    fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = path.strip_prefix('/')?.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Capture(_) if part.is_empty() => return None,
                Segment::Capture(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

/// Ordered set of routes matched first-wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    pub fn new(specs: Vec<RouteSpec>) -> Result<Self> {
        let routes = specs.into_iter().map(CompiledRoute::compile).collect::<Result<Vec<_>>>()?;
        Ok(Self { routes })
    }

    /// Load a route table from a YAML (`.yaml`/`.yml`) or JSON document.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| Error::io_at(e, path))?;
        let is_yaml =
            matches!(path.extension().and_then(|ext| ext.to_str()), Some("yaml") | Some("yml"));

        let file: RouteTableFile = if is_yaml {
            serde_yaml::from_str(&raw).map_err(|e| Error::decode_at(e, path))?
        } else {
            serde_json::from_str(&raw).map_err(|e| Error::decode_at(e, path))?
        };

        let table = Self::new(file.routes).map_err(|e| e.context(path.display().to_string()))?;
        info!(path = %path.display(), routes = table.len(), "Loaded route table");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteMatcher for RouteTable {
    fn route_match(&self, method: &str, path: &str) -> Option<RouteMatch> {
        let matched = self.routes.iter().filter(|route| route.accepts_method(method)).find_map(
            |route| route.captures(path).map(|params| (route, params)),
        );

        let Some((route, params)) = matched else {
            debug!(method, path, "No route matched");
            return None;
        };

        Some(RouteMatch {
            method: method.to_string(),
            path: path.to_string(),
            params,
            route_path: route.spec.template.clone(),
            member_name: route.spec.member_name.clone(),
            action: route.spec.action.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(template: &str, methods: &[&str], action: Option<&str>) -> RouteSpec {
        RouteSpec {
            template: template.to_string(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
            member_name: Some("volume".to_string()),
            action: action.map(str::to_string),
        }
    }

    fn volume_table() -> RouteTable {
        RouteTable::new(vec![
            spec("/{project_id}/volumes", &["GET", "POST"], Some("index")),
            spec("/{project_id}/volumes/:(id)/action", &["POST"], Some("action")),
            spec("/{project_id}/volumes/:(id)", &[], Some("show")),
        ])
        .unwrap()
    }

    #[test]
    fn test_segment_parsing() {
        assert_eq!(Segment::parse("volumes"), Some(Segment::Literal("volumes".into())));
        assert_eq!(Segment::parse("{project_id}"), Some(Segment::Capture("project_id".into())));
        assert_eq!(Segment::parse(":(id)"), Some(Segment::Capture("id".into())));
        assert_eq!(Segment::parse(":id"), Some(Segment::Capture("id".into())));
        assert_eq!(Segment::parse("{}"), None);
    }

    #[test]
    fn test_collection_match() {
        let matched = volume_table().route_match("GET", "/abc123/volumes").unwrap();
        assert_eq!(matched.route_path, "/{project_id}/volumes");
        assert_eq!(matched.tenant_id(), Some("abc123"));
        assert_eq!(matched.action.as_deref(), Some("index"));
        assert_eq!(matched.member_name.as_deref(), Some("volume"));
    }

    #[test]
    fn test_member_and_action_routes() {
        let table = volume_table();

        let show = table.route_match("DELETE", "/abc/volumes/v-1").unwrap();
        assert_eq!(show.param("id"), Some("v-1"));
        assert_eq!(show.action.as_deref(), Some("show"));

        let action = table.route_match("POST", "/abc/volumes/v-1/action").unwrap();
        assert_eq!(action.route_path, "/{project_id}/volumes/:(id)/action");
        assert_eq!(action.action.as_deref(), Some("action"));
    }

    #[test]
    fn test_method_filter_is_case_insensitive() {
        let table = volume_table();
        assert!(table.route_match("get", "/abc/volumes").is_some());
        assert!(table.route_match("PUT", "/abc/volumes").is_none());
    }

    #[test]
    fn test_no_match() {
        let table = volume_table();
        assert!(table.route_match("GET", "/abc/snapshots").is_none());
        assert!(table.route_match("GET", "/abc/volumes/").is_none());
        assert!(table.route_match("GET", "volumes").is_none());
    }

    #[test]
    fn test_invalid_templates_rejected() {
        assert!(RouteTable::new(vec![spec("volumes", &[], None)]).is_err());
        assert!(RouteTable::new(vec![spec("/{}/volumes", &[], None)]).is_err());
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.yaml");
        fs::write(
            &path,
            r#"
routes:
  - template: "/{project_id}/volumes"
    methods: ["GET"]
    member_name: volume
    action: index
"#,
        )
        .unwrap();

        let table = RouteTable::from_file(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.route_match("GET", "/t1/volumes").is_some());
    }

    #[test]
    fn test_from_file_missing() {
        let err = RouteTable::from_file(Path::new("/nonexistent/routes.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
