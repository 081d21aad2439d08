//! Resource id extraction from the source a mapping entry declares.

use tracing::debug;

use super::body::LazyBody;
use super::json_path::{value_to_id, JsonPath};
use super::ClassificationError;
use crate::mapping::{MappingEntry, ResourceParamSource};
use crate::routing::{resource_id_key, RouteMatch};

/// Pulls resource ids for one request.
///
/// `Ok(None)` means the source was consulted and held no id; the resolver
/// turns that into [`ClassificationError::MissingResourceId`].
pub struct ResourceIdExtractor<'r, 'b> {
    route: &'r RouteMatch,
    resource_key: String,
    body: &'r LazyBody<'b>,
    query: Option<&'r str>,
}

impl<'r, 'b> ResourceIdExtractor<'r, 'b> {
    pub fn new(route: &'r RouteMatch, body: &'r LazyBody<'b>, query: Option<&'r str>) -> Self {
        let resource_key = resource_id_key(route.member_name.as_deref());
        Self { route, resource_key, body, query }
    }

    pub fn route(&self) -> &RouteMatch {
        self.route
    }

    pub fn extract(&self, entry: &MappingEntry) -> Result<Option<String>, ClassificationError> {
        match &entry.resource_param_source {
            ResourceParamSource::Url => Ok(self.from_url()),
            ResourceParamSource::JsonBody => self.from_json_body(entry.json_path.as_deref()),
            ResourceParamSource::QueryString => {
                self.from_query_string(entry.resource_param_name.as_deref())
            }
            ResourceParamSource::Unsupported(source) => Err(ClassificationError::invalid_mapping(
                format!("unsupported resourceParamSource '{}'", source),
            )),
        }
    }

    fn from_url(&self) -> Option<String> {
        self.route.param("id").or_else(|| self.route.param(&self.resource_key)).map(str::to_string)
    }

    fn from_json_body(
        &self,
        json_path: Option<&str>,
    ) -> Result<Option<String>, ClassificationError> {
        let expression = json_path.filter(|path| !path.trim().is_empty()).ok_or_else(|| {
            ClassificationError::invalid_mapping("jsonBody source without a jsonPath")
        })?;
        let path = JsonPath::parse(expression).map_err(|e| {
            let message = format!("invalid jsonPath '{}': {}", expression, e);
            ClassificationError::invalid_mapping(message)
        })?;

        // an unreadable stream fails the request; an unparsable one yields no id
        self.body.bytes()?;
        let body = match self.body.json() {
            Ok(body) => body,
            Err(err) => {
                debug!(error = %err, "Body unreadable for resource id");
                return Ok(None);
            }
        };

        match path.evaluate(body) {
            Ok(value) => Ok(value_to_id(value)),
            Err(miss) => {
                debug!(json_path = %path, reason = %miss, "Resource id not found in body");
                Ok(None)
            }
        }
    }

    fn from_query_string(
        &self,
        param_name: Option<&str>,
    ) -> Result<Option<String>, ClassificationError> {
        let name = param_name.filter(|name| !name.is_empty()).ok_or_else(|| {
            ClassificationError::invalid_mapping("queryString source without a resourceParamName")
        })?;
        let query = self.query.ok_or_else(|| {
            ClassificationError::missing_resource_id(format!(
                "query string required for parameter '{}'",
                name
            ))
        })?;

        Ok(query
            .split('&')
            .find(|item| item.contains(name))
            .and_then(|item| item.rsplit('=').next())
            .map(str::to_string))
    }
}
