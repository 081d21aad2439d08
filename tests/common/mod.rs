//! Shared fixtures for the integration tests.
//!
//! Every fixture copies the sample deployment files from `config/` into its
//! own temporary directory so tests can rewrite the mapping document freely.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use route_classifier::{
    api::build_router, config::ClassifierConfig, RequestClassifier, ResourceDescriptor, RouteTable,
};
use tempfile::TempDir;
use tower::ServiceExt;

pub const MAX_BODY_SIZE: usize = 64 * 1024;

pub struct Fixture {
    pub dir: TempDir,
    pub classifier: Arc<RequestClassifier>,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let samples = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
        for name in ["mapping.json", "routes.yaml"] {
            fs::copy(samples.join(name), dir.path().join(name)).expect("copy sample file");
        }

        let config = ClassifierConfig {
            config_dirs: vec![dir.path().to_path_buf()],
            script_name: "/v2".to_string(),
            ..Default::default()
        };
        let routes = RouteTable::from_file(&config.routes_path().expect("routes path"))
            .expect("load route table");
        let classifier = RequestClassifier::from_config(&config, Arc::new(routes))
            .expect("build classifier");

        Self { dir, classifier: Arc::new(classifier) }
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.dir.path().join("mapping.json")
    }

    /// Replace the mapping document and push its mtime forward.
    ///
    /// The new content is staged beside the file and renamed over it, the
    /// way a deployment swaps configuration.
    pub fn rewrite_mapping(&self, contents: &str) {
        let path = self.mapping_path();
        let previous = fs::metadata(&path).and_then(|m| m.modified()).expect("mtime");
        let staged = self.dir.path().join("mapping.json.new");
        fs::write(&staged, contents).expect("write mapping");
        set_mtime(&staged, previous + Duration::from_secs(5));
        fs::rename(&staged, &path).expect("swap mapping");
    }

    pub fn router(&self) -> Router {
        build_router(self.classifier.clone(), MAX_BODY_SIZE)
    }

    pub async fn send(&self, method: Method, uri: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");

        let response = self.router().oneshot(request).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.expect("body").to_bytes();
        TestResponse { status, headers, body }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn descriptors(&self) -> Vec<ResourceDescriptor> {
        serde_json::from_slice(&self.body).expect("descriptor list")
    }

    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.body).expect("utf-8 body")
    }
}

pub fn descriptor(action: &str, resource: &str) -> ResourceDescriptor {
    ResourceDescriptor { action: action.to_string(), resource: resource.to_string() }
}

pub fn set_mtime(path: &Path, mtime: SystemTime) {
    let file = fs::File::options().write(true).open(path).expect("open for mtime");
    file.set_modified(mtime).expect("set mtime");
}
