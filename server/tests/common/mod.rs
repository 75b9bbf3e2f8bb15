use std::path::Path;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;
use verstore::{FileService, GitRemote, OpenOptions, VersionStore};
use verstore_server::{build_app, AppState};

/// A router over fresh `oldcode`/`newcode` roots in a temp directory.
pub struct TestApp {
    pub dir: TempDir,
    pub app: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let service = create_service(dir.path());
        let app = build_app(AppState::new(service), 300, false);
        Self { dir, app }
    }

    /// Like [`TestApp::new`], mirroring saves to a fresh bare git repository.
    #[allow(dead_code)]
    pub fn with_git() -> Self {
        let dir = TempDir::new().unwrap();
        let remote = GitRemote::open(
            dir.path().join("docs.git"),
            OpenOptions {
                create: true,
                ..Default::default()
            },
        )
        .unwrap();
        let service = create_service(dir.path()).with_remote(Arc::new(remote));
        let app = build_app(AppState::new(service), 300, false);
        Self { dir, app }
    }

    pub fn source_root(&self) -> std::path::PathBuf {
        self.dir.path().join("oldcode")
    }

    pub fn versioned_root(&self) -> std::path::PathBuf {
        self.dir.path().join("newcode")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = self
            .send(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    pub async fn put_json(
        &self,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let (status, body) = self
            .send(
                Request::put(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = self
            .send(Request::delete(uri).body(Body::empty()).unwrap())
            .await;
        (status, serde_json::from_slice(&body).unwrap())
    }
}

fn create_service(dir: &Path) -> FileService {
    std::fs::create_dir_all(dir.join("oldcode")).unwrap();
    std::fs::create_dir_all(dir.join("newcode")).unwrap();
    FileService::new(VersionStore::new(dir.join("oldcode"), dir.join("newcode")))
}

/// Write a file (and its parents) directly on disk.
pub fn put(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}
