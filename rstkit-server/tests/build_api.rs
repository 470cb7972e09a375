//! `/api/build` against a stand-in build tool.
#![cfg(unix)]

use std::fs;
use std::io::{Cursor, Read};
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use rstkit_core::Config;
use rstkit_server::{router, AppState};
use rstkit_store::{ArtifactPublisher, MemoryObjectStore};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use zip::ZipArchive;

const FAKE_SPHINX: &str = r#"#!/bin/sh
set -e
mkdir -p "$4"
cp "$3/index.rst" "$4/index.html"
"#;

const FAILING_SPHINX: &str = r#"#!/bin/sh
echo "index.rst:1: WARNING: Title underline too short." >&2
exit 1
"#;

fn config_with_tool(dir: &TempDir, script: &str) -> Config {
    let tool = dir.path().join("sphinx-build");
    fs::write(&tool, script).unwrap();
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

    let mut config = Config::default();
    config.build.sphinx_bin = tool;
    config.build.work_root = Some(dir.path().join("work"));
    config
}

fn build_request(body: Value) -> Request<Body> {
    Request::post("/api/build")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn work_root_entries(dir: &TempDir) -> usize {
    fs::read_dir(dir.path().join("work"))
        .map(|it| it.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn build_returns_zip_attachment() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(AppState::new(config_with_tool(&dir, FAKE_SPHINX), None));

    let response = app
        .oneshot(build_request(json!({"content_list": ["Intro\n=====\n", "Body.\n"]})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"build.zip\""
    );
    assert!(response.headers().get("x-stored-name").is_none());

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut html = String::new();
    archive
        .by_name("index.html")
        .unwrap()
        .read_to_string(&mut html)
        .unwrap();
    assert_eq!(html, "Intro\n=====\n\nBody.\n");
    assert_eq!(work_root_entries(&dir), 0);
}

#[tokio::test]
async fn build_failure_carries_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(AppState::new(config_with_tool(&dir, FAILING_SPHINX), None));

    let response = app
        .oneshot(build_request(json!({"content_list": ["Intro\n==\n"]})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Build failed");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Title underline too short"));
    assert_eq!(work_root_entries(&dir), 0);
}

#[tokio::test]
async fn build_with_publish_reports_stored_name() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryObjectStore::new());
    let publisher = ArtifactPublisher::new(store.clone());
    let app = router(AppState::new(
        config_with_tool(&dir, FAKE_SPHINX),
        Some(publisher),
    ));

    let first = app
        .clone()
        .oneshot(build_request(json!({"content_list": ["a\n"], "publish": true})))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-stored-name"], "build.zip");

    let second = app
        .oneshot(build_request(json!({"content_list": ["b\n"], "publish": true})))
        .await
        .unwrap();
    let stored = second.headers()["x-stored-name"].to_str().unwrap().to_string();
    assert_ne!(stored, "build.zip");
    assert_eq!(store.keys().len(), 2);
}
