//! Publishing against real stores: a directory and a local HTTP bucket.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::routing::any;
use axum::Router;
use rstkit_store::{
    ArtifactPublisher, FsObjectStore, HttpObjectStore, ObjectStore, PublishError,
};
use tempfile::tempdir;

#[derive(Clone, Default)]
struct FakeBucket {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    tokens: Arc<Mutex<Vec<Option<String>>>>,
}

async fn object(
    State(bucket): State<FakeBucket>,
    Path((name, key)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if name == "down" {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    bucket.tokens.lock().unwrap().push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );

    let mut objects = bucket.objects.lock().unwrap();
    let id = format!("{name}/{key}");
    match method {
        Method::HEAD | Method::GET if objects.contains_key(&id) => StatusCode::OK,
        Method::HEAD | Method::GET => StatusCode::NOT_FOUND,
        Method::PUT if objects.contains_key(&id) => StatusCode::PRECONDITION_FAILED,
        Method::PUT => {
            objects.insert(id, body.to_vec());
            StatusCode::OK
        }
        _ => StatusCode::METHOD_NOT_ALLOWED,
    }
}

async fn spawn_bucket() -> (String, FakeBucket) {
    let bucket = FakeBucket::default();
    let app = Router::new()
        .route("/{bucket}/{key}", any(object))
        .with_state(bucket.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), bucket)
}

#[tokio::test]
async fn fs_store_same_name_twice_keeps_both() {
    let dir = tempdir().unwrap();
    let publisher = ArtifactPublisher::new(Arc::new(FsObjectStore::new(dir.path())));

    let first = publisher.publish("build.zip", b"first").await.unwrap();
    let second = publisher.publish("build.zip", b"second").await.unwrap();

    assert_eq!(first.as_str(), "build.zip");
    assert_ne!(second.as_str(), "build.zip");
    assert_eq!(std::fs::read(dir.path().join("build.zip")).unwrap(), b"first");
    assert_eq!(std::fs::read(dir.path().join(second.as_str())).unwrap(), b"second");
}

#[tokio::test]
async fn fs_store_path_like_names_stay_inside_root() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("objects");
    let publisher = ArtifactPublisher::new(Arc::new(FsObjectStore::new(&root)));

    let stored = publisher.publish("../../outside.txt", b"x").await.unwrap();
    assert_eq!(stored.as_str(), "outside.txt");
    assert!(root.join("outside.txt").exists());
    assert!(!dir.path().join("outside.txt").exists());
}

#[tokio::test]
async fn http_store_publishes_with_bearer_token() {
    let (endpoint, bucket) = spawn_bucket().await;
    let store = HttpObjectStore::new(&endpoint, "docs", Some("s3cret".into())).unwrap();
    let publisher = ArtifactPublisher::new(Arc::new(store));

    let first = publisher.publish("site.zip", b"one").await.unwrap();
    let second = publisher.publish("site.zip", b"two").await.unwrap();
    assert_eq!(first.as_str(), "site.zip");
    assert_ne!(first, second);

    let objects = bucket.objects.lock().unwrap();
    assert_eq!(objects["docs/site.zip"], b"one");
    assert_eq!(objects[&format!("docs/{second}")], b"two");

    let tokens = bucket.tokens.lock().unwrap();
    assert!(!tokens.is_empty());
    assert!(tokens.iter().all(|t| t.as_deref() == Some("Bearer s3cret")));
}

#[tokio::test]
async fn http_store_reports_existing_objects() {
    let (endpoint, _bucket) = spawn_bucket().await;
    let store = HttpObjectStore::new(&endpoint, "docs", None).unwrap();

    assert!(!store.exists("a.zip").await.unwrap());
    store.put("a.zip", b"a").await.unwrap();
    assert!(store.exists("a.zip").await.unwrap());
}

#[tokio::test]
async fn http_store_outage_is_store_unavailable() {
    let (endpoint, _bucket) = spawn_bucket().await;
    let store = HttpObjectStore::new(&endpoint, "down", None).unwrap();
    let publisher = ArtifactPublisher::new(Arc::new(store));

    let err = publisher.publish("a.zip", b"a").await.unwrap_err();
    assert!(matches!(err, PublishError::StoreUnavailable(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_store_unavailable() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = HttpObjectStore::new(&format!("http://{addr}"), "docs", None).unwrap();
    let publisher = ArtifactPublisher::new(Arc::new(store));
    assert!(matches!(
        publisher.publish("a.zip", b"a").await,
        Err(PublishError::StoreUnavailable(_))
    ));
}
