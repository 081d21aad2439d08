//! Turns mapping rules into resource descriptors.

use super::extract::ResourceIdExtractor;
use super::{ClassificationError, ResourceDescriptor};
use crate::mapping::{MappingDocument, MappingEntry};
use crate::routing::{CanonicalUrl, RESOURCE_TYPE_KEY, TENANT_KEY};

/// Resolve the descriptors for a canonical URL, method and operation.
///
/// Descriptors come back in the order the mapping document lists the rules.
pub fn resolve(
    document: &MappingDocument,
    url: &CanonicalUrl,
    method: &str,
    operation: Option<&str>,
    extractor: &ResourceIdExtractor<'_, '_>,
) -> Result<Vec<ResourceDescriptor>, ClassificationError> {
    let entries = document.lookup(url, method, operation)?.ok_or_else(|| {
        ClassificationError::NoMappingFound {
            url: url.to_string(),
            method: method.to_string(),
            operation: operation.map(str::to_string),
        }
    })?;

    entries.iter().map(|entry| describe(document, entry, extractor)).collect()
}

fn describe(
    document: &MappingDocument,
    entry: &MappingEntry,
    extractor: &ResourceIdExtractor<'_, '_>,
) -> Result<ResourceDescriptor, ClassificationError> {
    let (Some(action), Some(format), Some(resource_type)) = (
        non_empty(&entry.action),
        non_empty(&document.resource_format),
        non_empty(&entry.resource_type),
    ) else {
        return Err(ClassificationError::invalid_mapping(
            "action/resource details missing in mapping file",
        ));
    };

    let tenant_id = extractor.route().tenant_id();
    let mut resource = match tenant_id {
        Some(tenant_id) => format.replace(TENANT_KEY, tenant_id),
        None if format.contains(TENANT_KEY) => {
            return Err(ClassificationError::invalid_mapping(format!(
                "resource format '{}' needs a tenant but route '{}' captures none",
                format,
                extractor.route().route_path
            )));
        }
        None => format.to_string(),
    };
    resource = resource.replace(RESOURCE_TYPE_KEY, resource_type);

    if entry.is_resource_id_required {
        let resource_id = if resource_type == TENANT_KEY {
            tenant_id.map(str::to_string)
        } else {
            extractor.extract(entry)?
        };

        let resource_id = resource_id.filter(|id| !id.is_empty()).ok_or_else(|| {
            ClassificationError::missing_resource_id(format!(
                "{} requires a {} id from {:?}",
                action, resource_type, entry.resource_param_source
            ))
        })?;

        resource.push(':');
        resource.push_str(&resource_id);
    }

    Ok(ResourceDescriptor { action: action.to_string(), resource })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
