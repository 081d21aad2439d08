use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, Extension, Json, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::middleware::{classify_requests, ClassifierState};
use crate::{
    classifier::{ActionResourceList, RequestClassifier},
    config::ServerConfig,
    errors::Error,
};

/// Router answering every classified request with its descriptors as JSON.
///
/// Embedders that forward to a real backend layer [`classify_requests`] over
/// their own router instead.
pub fn build_router(classifier: Arc<RequestClassifier>, max_body_size: usize) -> Router {
    let state = ClassifierState::new(classifier, max_body_size);

    Router::new().fallback(report_descriptors).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn_with_state(state, classify_requests)),
    )
}

async fn report_descriptors(
    Extension(descriptors): Extension<ActionResourceList>,
) -> Json<ActionResourceList> {
    Json(descriptors)
}

pub async fn start_server(
    config: &ServerConfig,
    classifier: Arc<RequestClassifier>,
) -> crate::Result<()> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| Error::config(format!("Invalid server address: {}", e)))?;

    let router = build_router(classifier, config.max_body_size);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::from(e).context(format!("Failed to bind {}", addr)))?;

    info!(address = %addr, "Starting classification server");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Shutdown listener failed");
            }
        })
        .await
        .map_err(|e| Error::from(e).context("Classification server error"))?;

    info!("Classification server shutdown completed");
    Ok(())
}
