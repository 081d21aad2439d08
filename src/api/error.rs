use axum::{
    http::{header::CONTENT_TYPE, HeaderValue},
    response::{IntoResponse, Response},
};

use crate::classifier::ClassificationError;

/// Terminal response for a request that could not be classified.
///
/// The body is the status line as plain text, or empty for `HEAD`.
#[derive(Debug)]
pub struct ClassificationRejection {
    error: ClassificationError,
    head: bool,
}

impl ClassificationRejection {
    pub fn new(error: ClassificationError, head: bool) -> Self {
        Self { error, head }
    }

    pub fn error(&self) -> &ClassificationError {
        &self.error
    }
}

impl IntoResponse for ClassificationRejection {
    fn into_response(self) -> Response {
        let body = if self.head { "" } else { self.error.status_line() };
        let mut response = (self.error.status_code(), body).into_response();
        response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        response
    }
}
