use serde::{Deserialize, Serialize};

/// One authorization question: may the caller perform `action` on `resource`?
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub action: String,
    /// Resource name built from the mapping's resource format, with `:id`
    /// appended when the rule requires an identifier.
    pub resource: String,
}

/// Descriptors attached to a classified request for downstream stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionResourceList(pub Vec<ResourceDescriptor>);
