//! Classification failures and their HTTP mapping.

use axum::http::StatusCode;
use tracing::{error, warn};

use crate::errors::Error;

/// Why a request could not be classified.
///
/// Every variant aborts classification; no partial descriptor list is ever
/// produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationError {
    /// Method or path absent from the inbound request.
    #[error("request method or path missing")]
    MissingRequestLine,

    /// The router has no route for the request.
    #[error("no route matches {method} {path}")]
    NoRouteMatch { method: String, path: String },

    /// The body needed for disambiguation is not a single-key JSON object.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// The mapping document has no rules for the request.
    #[error("no mapping for {method} {url}{}", operation_suffix(.operation))]
    NoMappingFound { url: String, method: String, operation: Option<String> },

    /// The mapping document (or the file holding it) is unusable.
    #[error("invalid mapping document: {0}")]
    MappingDocumentInvalid(String),

    /// A required resource id could not be found in the request.
    #[error("resource id missing: {0}")]
    MissingResourceId(String),
}

impl ClassificationError {
    pub fn invalid_mapping<S: Into<String>>(message: S) -> Self {
        Self::MappingDocumentInvalid(message.into())
    }

    pub fn missing_resource_id<S: Into<String>>(message: S) -> Self {
        Self::MissingResourceId(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedBody(_) | Self::MissingResourceId(_) => StatusCode::BAD_REQUEST,
            Self::NoRouteMatch { .. } | Self::NoMappingFound { .. } => StatusCode::NOT_FOUND,
            Self::MissingRequestLine | Self::MappingDocumentInvalid(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    /// Status line text, also used as the plain-text response body.
    pub fn status_line(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "400 Bad Request",
            StatusCode::NOT_FOUND => "404 Not Found",
            _ => "503 Service unavailable",
        }
    }

    /// True for faults an operator has to fix rather than the client.
    pub fn is_service_fault(&self) -> bool {
        self.status_code() == StatusCode::SERVICE_UNAVAILABLE
    }

    pub(crate) fn log(&self) {
        if self.is_service_fault() {
            error!(severity = "critical", error = %self, "Classification failed on service fault");
        } else {
            warn!(status = self.status_code().as_u16(), error = %self, "Request rejected");
        }
    }
}

fn operation_suffix(operation: &Option<String>) -> String {
    operation.as_ref().map(|op| format!(" ({})", op)).unwrap_or_default()
}

impl From<Error> for ClassificationError {
    fn from(err: Error) -> Self {
        Self::MappingDocumentInvalid(err.to_string())
    }
}
