//! Canonical URL construction.
//!
//! A matched route template such as `/{project_id}/volumes/:(id)` becomes the
//! mapping-document key `/v2/{tenant_id}/volumes/{volume_id}`. Only the first
//! segment of each placeholder kind is rewritten; routes that nest two
//! parameterized collections keep their second placeholder untouched.

use std::fmt;

use super::{RouteMatch, ID_KEY, ID_SUFFIX, PROJECT_KEY, TENANT_KEY};

/// Member names whose identifier placeholder does not follow `<member>_id`.
const RESOURCE_ID_OVERRIDES: &[(&str, &str)] =
    &[("os-quota-sets", "tenant_id"), ("backups", "backup_id")];

/// Key into the mapping document derived from a route template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CanonicalUrl {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier placeholder name for a member name.
///
/// Routes without a member name fall back to the bare `id`.
pub fn resource_id_key(member_name: Option<&str>) -> String {
    let Some(member) = member_name else {
        return "id".to_string();
    };

    RESOURCE_ID_OVERRIDES
        .iter()
        .find(|(name, _)| *name == member)
        .map(|(_, key)| (*key).to_string())
        .unwrap_or_else(|| format!("{}{}", member, ID_SUFFIX))
}

/// Build the canonical URL for `route`, prefixed with the mount `script_name`.
pub fn generalize(script_name: &str, route: &RouteMatch) -> CanonicalUrl {
    let mut parts: Vec<String> = route.route_path.split('/').map(str::to_string).collect();

    if let Some(part) = parts.iter_mut().find(|part| part.contains(PROJECT_KEY)) {
        *part = part.replace(PROJECT_KEY, TENANT_KEY);
    }

    if let Some(part) = parts.iter_mut().find(|part| part.contains(ID_KEY)) {
        *part = format!("{{{}}}", resource_id_key(route.member_name.as_deref()));
    }

    CanonicalUrl(format!("{}{}", script_name, parts.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn route(route_path: &str, member_name: Option<&str>) -> RouteMatch {
        RouteMatch {
            method: "GET".to_string(),
            path: String::new(),
            params: HashMap::new(),
            route_path: route_path.to_string(),
            member_name: member_name.map(str::to_string),
            action: None,
        }
    }

    #[test]
    fn default_suffix_rule() {
        assert_eq!(resource_id_key(Some("volume")), "volume_id");
        assert_eq!(resource_id_key(Some("snapshot")), "snapshot_id");
    }

    #[test]
    fn override_table_wins() {
        assert_eq!(resource_id_key(Some("os-quota-sets")), "tenant_id");
        assert_eq!(resource_id_key(Some("backups")), "backup_id");
    }

    #[test]
    fn missing_member_name_falls_back_to_id() {
        assert_eq!(resource_id_key(None), "id");
    }

    #[test]
    fn rewrites_project_and_id() {
        let url = generalize("/v2", &route("/{project_id}/volumes/:(id)", Some("volume")));
        assert_eq!(url.as_str(), "/v2/{tenant_id}/volumes/{volume_id}");
    }

    #[test]
    fn collection_route_keeps_literals() {
        let url = generalize("/v2", &route("/{project_id}/volumes", Some("volume")));
        assert_eq!(url.as_str(), "/v2/{tenant_id}/volumes");
    }

    #[test]
    fn action_suffix_is_preserved() {
        let url = generalize("/v2", &route("/{project_id}/volumes/:(id)/action", Some("volume")));
        assert_eq!(url.as_str(), "/v2/{tenant_id}/volumes/{volume_id}/action");
    }

    #[test]
    fn only_first_id_segment_is_rewritten() {
        let url = generalize(
            "",
            &route("/{project_id}/volumes/:(id)/snapshots/:(id)", Some("volume")),
        );
        assert_eq!(url.as_str(), "/{tenant_id}/volumes/{volume_id}/snapshots/:(id)");
    }

    #[test]
    fn empty_script_name() {
        let route = route("/{project_id}/os-quota-sets/:(id)", Some("os-quota-sets"));
        let url = generalize("", &route);
        assert_eq!(url.as_str(), "/{tenant_id}/os-quota-sets/{tenant_id}");
    }

    fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z]{1,8}",
            Just("{project_id}".to_string()),
            Just("x-project_id".to_string()),
            Just(":(id)".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn tenant_rewrite_touches_exactly_one_segment(
            segments in prop::collection::vec(segment(), 1..8)
        ) {
            let template = format!("/{}", segments.join("/"));
            let url = generalize("", &route(&template, Some("volume")));

            let before: Vec<&str> = template.split('/').collect();
            let after: Vec<&str> = url.as_str().split('/').collect();
            prop_assert_eq!(before.len(), after.len());

            let rewritten = before
                .iter()
                .zip(after.iter())
                .filter(|(b, a)| b.contains(PROJECT_KEY) && a.contains(TENANT_KEY))
                .count();
            let expected = usize::from(before.iter().any(|b| b.contains(PROJECT_KEY)));
            prop_assert_eq!(rewritten, expected);
        }

        #[test]
        fn id_rewrite_touches_at_most_one_segment(
            segments in prop::collection::vec(segment(), 1..8)
        ) {
            let template = format!("/{}", segments.join("/"));
            let url = generalize("", &route(&template, Some("volume")));

            let remaining = url.as_str().split('/').filter(|s| s.contains(ID_KEY)).count();
            let original = template.split('/').filter(|s| s.contains(ID_KEY)).count();
            prop_assert_eq!(remaining, original.saturating_sub(1));
        }
    }
}
