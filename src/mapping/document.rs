//! Mapping document model.
//!
//! ```json
//! {
//!   "resource_format": "tenant_id/resourceType",
//!   "/v2/{tenant_id}/volumes": {
//!     "GET": [{"action": "list", "resourceType": "volumes"}],
//!     "POST": {"os-attach": [{"action": "attach", "resourceType": "volumes"}]}
//!   }
//! }
//! ```
//!
//! Entry fields are optional at decode time; the resolver checks the ones it
//! needs so that one incomplete rule only breaks the requests that reach it.
//! Top-level keys whose value is not a method map are kept as-is and only
//! rejected when a request looks them up.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::errors::{Error, Result};
use crate::routing::CanonicalUrl;

/// Where a required resource id is read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ResourceParamSource {
    /// Captured path parameter.
    #[default]
    Url,
    /// Value at `jsonPath` inside the request body.
    JsonBody,
    /// Value of `resourceParamName` in the query string.
    QueryString,
    /// Any other value; rejected when an entry needs it.
    Unsupported(String),
}

impl From<String> for ResourceParamSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" | "url" => Self::Url,
            "jsonBody" => Self::JsonBody,
            "queryString" => Self::QueryString,
            _ => Self::Unsupported(value),
        }
    }
}

/// One action/resource rule.
///
/// `null` in `isResourceIdRequired` or `resourceParamSource` reads as the
/// field's default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_resource_id_required: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_param_source: ResourceParamSource,
    #[serde(default)]
    pub json_path: Option<String>,
    #[serde(default)]
    pub resource_param_name: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Rules registered for one URL and method.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MethodMapping {
    /// Rules applying to every request with this method.
    Entries(Vec<MappingEntry>),
    /// Rules keyed by the operation named in the request body.
    Operations(HashMap<String, Vec<MappingEntry>>),
}

/// Value stored under one top-level key of the document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UrlMapping {
    /// Rules keyed by HTTP method.
    Methods(HashMap<String, MethodMapping>),
    /// Anything else, such as a `"_comment"` string or a rule list that does
    /// not decode.
    Other(Value),
}

/// Parsed mapping document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MappingDocument {
    /// Template combining the tenant and resource type into a resource name.
    #[serde(default)]
    pub resource_format: Option<String>,
    #[serde(flatten)]
    pub urls: HashMap<String, UrlMapping>,
}

impl MappingDocument {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Rules for a canonical URL, method and optional operation.
    ///
    /// Returns `Ok(None)` when any key is absent, and when the document's
    /// shape at that point disagrees with whether an operation was supplied.
    /// Fails when the URL's value is not a method map.
    pub fn lookup(
        &self,
        url: &CanonicalUrl,
        method: &str,
        operation: Option<&str>,
    ) -> Result<Option<&[MappingEntry]>> {
        let methods = match self.urls.get(url.as_str()) {
            None => return Ok(None),
            Some(UrlMapping::Methods(methods)) => methods,
            Some(UrlMapping::Other(value)) => return Err(unusable_rules(url, value)),
        };

        let Some(mapping) = methods.get(method) else {
            return Ok(None);
        };
        Ok(match (mapping, operation) {
            (MethodMapping::Entries(entries), None) => Some(entries.as_slice()),
            (MethodMapping::Operations(operations), Some(operation)) => {
                operations.get(operation).map(Vec::as_slice)
            }
            _ => None,
        })
    }
}

fn unusable_rules(url: &CanonicalUrl, value: &Value) -> Error {
    let reason = match HashMap::<String, MethodMapping>::deserialize(value) {
        Err(err) => err.to_string(),
        Ok(_) => "not a method map".to_string(),
    };
    let message = format!("rules for {} are unusable: {}", url, reason);
    Error::validation_field(message, url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "resource_format": "tenant_id/resourceType",
        "/v2/{tenant_id}/volumes": {
            "GET": [{"action": "list", "resourceType": "volumes", "isResourceIdRequired": false}]
        },
        "/v2/{tenant_id}/volumes/{volume_id}/action": {
            "POST": {
                "os-attach": [
                    {"action": "attach", "resourceType": "volumes", "isResourceIdRequired": true},
                    {"action": "attach", "resourceType": "servers",
                     "isResourceIdRequired": true, "resourceParamSource": "jsonBody",
                     "jsonPath": "os-attach.instance_uuid"}
                ]
            }
        }
    }"#;

    #[test]
    fn test_decode_document() {
        let doc = MappingDocument::from_json(DOCUMENT).unwrap();
        assert_eq!(doc.resource_format.as_deref(), Some("tenant_id/resourceType"));
        assert_eq!(doc.urls.len(), 2);
    }

    #[test]
    fn test_lookup_plain_entries() {
        let doc = MappingDocument::from_json(DOCUMENT).unwrap();
        let entries =
            doc.lookup(&"/v2/{tenant_id}/volumes".into(), "GET", None).unwrap().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action.as_deref(), Some("list"));
        assert_eq!(entries[0].resource_param_source, ResourceParamSource::Url);
        assert!(!entries[0].is_resource_id_required);
    }

    #[test]
    fn test_lookup_operation_entries_keep_order() {
        let doc = MappingDocument::from_json(DOCUMENT).unwrap();
        let url = CanonicalUrl::from("/v2/{tenant_id}/volumes/{volume_id}/action");
        let entries = doc.lookup(&url, "POST", Some("os-attach")).unwrap().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].resource_type.as_deref(), Some("volumes"));
        assert_eq!(entries[1].resource_param_source, ResourceParamSource::JsonBody);
        assert_eq!(entries[1].json_path.as_deref(), Some("os-attach.instance_uuid"));
    }

    #[test]
    fn test_lookup_misses() {
        let doc = MappingDocument::from_json(DOCUMENT).unwrap();
        let volumes = CanonicalUrl::from("/v2/{tenant_id}/volumes");
        let action = CanonicalUrl::from("/v2/{tenant_id}/volumes/{volume_id}/action");
        let miss = |url: &CanonicalUrl, method: &str, operation: Option<&str>| {
            doc.lookup(url, method, operation).unwrap().is_none()
        };

        assert!(miss(&"/v2/{tenant_id}/snapshots".into(), "GET", None));
        assert!(miss(&volumes, "DELETE", None));
        assert!(miss(&action, "POST", Some("os-detach")));
        // shape mismatches
        assert!(miss(&action, "POST", None));
        assert!(miss(&volumes, "GET", Some("reboot")));
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!(ResourceParamSource::from(String::new()), ResourceParamSource::Url);
        assert_eq!(
            ResourceParamSource::from("queryString".to_string()),
            ResourceParamSource::QueryString
        );
        assert_eq!(
            ResourceParamSource::from("header".to_string()),
            ResourceParamSource::Unsupported("header".to_string())
        );
    }

    #[test]
    fn test_string_boolean_rejected_on_lookup() {
        let raw = r#"{
            "/x": {"GET": [{"action": "a", "resourceType": "b", "isResourceIdRequired": "true"}]},
            "/y": {"GET": [{"action": "a", "resourceType": "b", "isResourceIdRequired": true}]}
        }"#;
        let doc = MappingDocument::from_json(raw).unwrap();

        let err = doc.lookup(&"/x".into(), "GET", None).unwrap_err();
        assert!(matches!(err, Error::Validation { field: Some(ref f), .. } if f == "/x"));

        let entries = doc.lookup(&"/y".into(), "GET", None).unwrap().unwrap();
        assert!(entries[0].is_resource_id_required);
    }

    #[test]
    fn test_null_fields_read_as_defaults() {
        let raw = r#"{"/x": {"GET": [{"action": "a", "resourceType": "b",
                                     "isResourceIdRequired": null,
                                     "resourceParamSource": null}]}}"#;
        let doc = MappingDocument::from_json(raw).unwrap();
        let entries = doc.lookup(&"/x".into(), "GET", None).unwrap().unwrap();
        assert!(!entries[0].is_resource_id_required);
        assert_eq!(entries[0].resource_param_source, ResourceParamSource::Url);
    }

    #[test]
    fn test_non_url_keys_are_tolerated_until_looked_up() {
        let raw = r#"{
            "_comment": "volume API rules",
            "resource_format": "tenant_id/resourceType",
            "/v2/{tenant_id}/volumes": {"GET": [{"action": "list", "resourceType": "volumes"}]}
        }"#;
        let doc = MappingDocument::from_json(raw).unwrap();

        let entries =
            doc.lookup(&"/v2/{tenant_id}/volumes".into(), "GET", None).unwrap().unwrap();
        assert_eq!(entries[0].action.as_deref(), Some("list"));
        assert!(matches!(
            doc.lookup(&"_comment".into(), "GET", None),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_missing_resource_format_is_tolerated_at_decode() {
        let doc = MappingDocument::from_json(r#"{"/x": {"GET": [{}]}}"#).unwrap();
        assert!(doc.resource_format.is_none());
        let entries = doc.lookup(&"/x".into(), "GET", None).unwrap().unwrap();
        assert_eq!(entries[0], MappingEntry::default());
    }
}
