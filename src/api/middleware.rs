//! Axum middleware running classification in front of downstream handlers.

use std::cell::Cell;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{request::Parts, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::runtime::Handle;
use tracing::Span;

use super::error::ClassificationRejection;
use crate::classifier::{
    ActionResourceList, ClassificationError, InboundRequest, LazyBody, RequestClassifier,
    ResourceDescriptor,
};
use crate::errors::Error;

/// Shared state for [`classify_requests`].
#[derive(Debug, Clone)]
pub struct ClassifierState {
    pub classifier: Arc<RequestClassifier>,
    /// Largest request body buffered for classification.
    pub max_body_size: usize,
}

impl ClassifierState {
    pub fn new(classifier: Arc<RequestClassifier>, max_body_size: usize) -> Self {
        Self { classifier, max_body_size }
    }
}

/// Classify the request and attach an [`ActionResourceList`] extension.
///
/// Classification runs on the blocking pool since it may stat and read the
/// mapping file. The body is buffered only when a rule needs it; otherwise
/// the original stream is forwarded untouched and `max_body_size` does not
/// apply.
///
/// Requests that cannot be classified are answered here and never reach
/// `next`.
pub async fn classify_requests(
    State(state): State<ClassifierState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let head = request.method() == Method::HEAD;
    let (parts, body) = request.into_parts();
    let runtime = Handle::current();
    let span = Span::current();

    let task = tokio::task::spawn_blocking(move || {
        let (body, result) = span.in_scope(|| classify(&state, &parts, body, &runtime));
        (parts, body, result)
    });

    match task.await {
        Ok((mut parts, body, Ok(descriptors))) => {
            parts.extensions.insert(ActionResourceList(descriptors));
            next.run(Request::from_parts(parts, body)).await
        }
        Ok((_, _, Err(error))) => ClassificationRejection::new(error, head).into_response(),
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(err) => {
            let error = ClassificationError::from(Error::sync(format!(
                "classification task cancelled: {}",
                err
            )));
            error.log();
            ClassificationRejection::new(error, head).into_response()
        }
    }
}

/// Runs the classifier, returning the body to forward alongside the result.
fn classify(
    state: &ClassifierState,
    parts: &Parts,
    body: Body,
    runtime: &Handle,
) -> (Body, Result<Vec<ResourceDescriptor>, ClassificationError>) {
    let stream = Cell::new(Some(body));
    let request = InboundRequest::new(parts.method.as_str(), parts.uri.path())
        .with_query(parts.uri.query())
        .with_body(LazyBody::try_new(|| {
            let body = stream.take().unwrap_or_else(Body::empty);
            runtime.block_on(to_bytes(body, state.max_body_size)).map_err(|err| {
                ClassificationError::MalformedBody(format!("unreadable body: {}", err))
            })
        }));

    let result = state.classifier.classify(&request);
    let forward = match stream.take() {
        Some(untouched) => untouched,
        None => match request.body.bytes() {
            Ok(raw) => Body::from(raw.clone()),
            Err(_) => Body::empty(),
        },
    };
    (forward, result)
}
