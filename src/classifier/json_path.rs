//! Dotted path expressions over JSON values.
//!
//! `server.id` reads field `id` of field `server`; `volumes[1].id` reads
//! field `id` of the second element of array `volumes`. Indexes may be
//! chained (`grid[0][2]`), and a segment made only of indexes (`[0]`) indexes
//! the current value.

use std::fmt;

use serde_json::Value;

/// Error parsing a path expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathSyntaxError {
    #[error("empty path expression")]
    Empty,
    #[error("empty segment in path '{0}'")]
    EmptySegment(String),
    #[error("invalid index in segment '{0}'")]
    InvalidIndex(String),
}

/// Why evaluation stopped before reaching a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMiss {
    MissingField(String),
    IndexOutOfRange { index: usize, len: usize },
    NotAnObject(String),
    NotAnArray(usize),
}

impl fmt::Display for PathMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathMiss::MissingField(field) => write!(f, "field '{}' not present", field),
            PathMiss::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range for array of {}", index, len)
            }
            PathMiss::NotAnObject(field) => {
                write!(f, "cannot read field '{}' of non-object", field)
            }
            PathMiss::NotAnArray(index) => write!(f, "cannot index [{}] into non-array", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    field: Option<String>,
    indexes: Vec<usize>,
}

impl Segment {
    fn parse(raw: &str, expression: &str) -> Result<Self, PathSyntaxError> {
        let (field, mut rest) = match raw.find('[') {
            Some(pos) => (&raw[..pos], &raw[pos..]),
            None => (raw, ""),
        };

        let mut indexes = Vec::new();
        while !rest.is_empty() {
            let inner = rest
                .strip_prefix('[')
                .and_then(|r| r.split_once(']'))
                .ok_or_else(|| PathSyntaxError::InvalidIndex(raw.to_string()))?;
            let index =
                inner.0.trim().parse().map_err(|_| PathSyntaxError::InvalidIndex(raw.to_string()))?;
            indexes.push(index);
            rest = inner.1;
        }

        if field.is_empty() && indexes.is_empty() {
            return Err(PathSyntaxError::EmptySegment(expression.to_string()));
        }

        let field = (!field.is_empty()).then(|| field.to_string());
        Ok(Self { field, indexes })
    }
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    expression: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(expression: &str) -> Result<Self, PathSyntaxError> {
        if expression.trim().is_empty() {
            return Err(PathSyntaxError::Empty);
        }

        let segments = expression
            .split('.')
            .map(|raw| Segment::parse(raw, expression))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { expression: expression.to_string(), segments })
    }

    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// Walk `root` along the path.
    pub fn evaluate<'v>(&self, root: &'v Value) -> Result<&'v Value, PathMiss> {
        let mut current = root;
        for segment in &self.segments {
            if let Some(field) = &segment.field {
                let object =
                    current.as_object().ok_or_else(|| PathMiss::NotAnObject(field.clone()))?;
                current = object.get(field).ok_or_else(|| PathMiss::MissingField(field.clone()))?;
            }
            for &index in &segment.indexes {
                let array = current.as_array().ok_or(PathMiss::NotAnArray(index))?;
                current = array
                    .get(index)
                    .ok_or(PathMiss::IndexOutOfRange { index, len: array.len() })?;
            }
        }
        Ok(current)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Textual form of a resolved value; `null` counts as absent.
/// Booleans render as `True` and `False`.
pub fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        other => Some(other.to_string()),
    }
}
