use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::Multipart;
use rstkit_build::{BuildError, BuildOrchestrator, BuildSettings, BuildSummary};
use rstkit_core::{assemble, Config, DocumentError, FragmentRequest};
use rstkit_store::{open_store, ArtifactPublisher, PublishError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

/// Filename of the `/api/document` download.
pub const DOCUMENT_FILENAME: &str = "generated_document.rst";

/// Response header naming the key a published build was stored under.
pub const STORED_NAME_HEADER: &str = "x-stored-name";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Arc<BuildOrchestrator>,
    pub publisher: Option<ArtifactPublisher>,
}

impl AppState {
    pub fn new(config: Config, publisher: Option<ArtifactPublisher>) -> Self {
        let orchestrator = BuildOrchestrator::new(BuildSettings::from_config(&config));
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            publisher,
        }
    }

    /// Wire the orchestrator and the configured object store, if any.
    pub fn from_config(config: Config, store_token: Option<String>) -> Result<Self> {
        let publisher = open_store(&config, store_token)
            .context("opening object store")?
            .map(ArtifactPublisher::new);
        Ok(Self::new(config, publisher))
    }
}

pub async fn serve(config: Config, store_token: Option<String>) -> Result<()> {
    let state = AppState::from_config(config, store_token)?;

    // The server still formats and assembles without a build tool.
    if let Err(err) = state.orchestrator.ensure_ready().await {
        warn!(error = %err, "build tool not ready; /api/build will fail");
    }

    let addr = state.config.server.listen_addr.clone();
    let app = router(state);

    info!(addr = %addr, "rstkit-server listening");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.upload_limit_mb.saturating_mul(1024 * 1024);

    let mut app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/status", get(status))
        .route("/api/format", post(format_fragment))
        .route("/api/document", post(generate_document))
        .route("/api/build", post(build_site))
        .route("/api/upload", post(upload_file))
        .layer(DefaultBodyLimit::max(body_limit));

    if let Some(dir) = state.config.static_dir() {
        // Unknown paths fall back to index.html so client-side routes load.
        let index = ServeFile::new(dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(&dir).fallback(index));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Errors surfaced by the API handlers, mapped to their status classes.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    InvalidInput(#[from] DocumentError),

    #[error("No object store configured")]
    NoStore,

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::InvalidInput(_) | ApiError::NoStore => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": self.to_string() })),
            )
                .into_response(),
            ApiError::Build(err) => {
                error!(phase = %err.phase(), error = %err, "build request failed");
                let detail = match err {
                    BuildError::BuildFailed { diagnostics, .. } => diagnostics.clone(),
                    other => other.to_string(),
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "message": "Build failed", "error": detail })),
                )
                    .into_response()
            }
            ApiError::Publish(err) => {
                error!(error = %err, "publishing build failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "message": "Publish failed" })),
                )
                    .into_response()
            }
        }
    }
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[derive(Serialize)]
struct StatusPayload {
    listening: String,
    config_path: Option<String>,
    build: BuildSummary,
    store: Option<String>,
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusPayload {
        listening: state.config.server.listen_addr.clone(),
        config_path: state.config.config_path().map(|p| p.display().to_string()),
        build: state.orchestrator.summary(),
        store: state.publisher.as_ref().map(|p| p.store().describe()),
    })
}

#[derive(Serialize)]
struct FormatResponse {
    formatted_text: String,
}

async fn format_fragment(Json(request): Json<FragmentRequest>) -> impl IntoResponse {
    Json(FormatResponse {
        formatted_text: request.format(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ContentListRequest {
    #[serde(default)]
    content_list: Option<Vec<String>>,
    /// Also publish the archive to the configured store.
    #[serde(default)]
    publish: bool,
}

impl ContentListRequest {
    fn document(&self) -> Result<String, DocumentError> {
        assemble(self.content_list.as_deref().unwrap_or_default())
    }
}

async fn generate_document(
    Json(request): Json<ContentListRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let document = request.document()?;
    info!(
        fragments = request.content_list.as_ref().map_or(0, Vec::len),
        bytes = document.len(),
        "document generated"
    );
    Ok((
        attachment_headers("text/x-rst; charset=utf-8", DOCUMENT_FILENAME),
        document,
    ))
}

async fn build_site(
    State(state): State<AppState>,
    Json(request): Json<ContentListRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let document = request.document()?;
    let publisher = if request.publish {
        Some(state.publisher.clone().ok_or(ApiError::NoStore)?)
    } else {
        None
    };

    let artifact = state.orchestrator.build(&document).await?;
    let mut headers = attachment_headers("application/zip", &artifact.file_name);

    if let Some(publisher) = publisher {
        let stored = publisher
            .publish(&artifact.file_name, &artifact.bytes)
            .await?;
        info!(stored_name = %stored, "build published");
        if let Ok(value) = HeaderValue::from_str(stored.as_str()) {
            headers.insert(HeaderName::from_static(STORED_NAME_HEADER), value);
        }
    }

    Ok((headers, artifact.bytes))
}

fn attachment_headers(content_type: &'static str, filename: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers
}

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    stored_name: String,
}

fn upload_message(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "message": message }))).into_response()
}

/// Publish the multipart `file` field under its own filename, or a fresh
/// name when that one is taken. Failure details stay in the server log.
async fn upload_file(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "malformed multipart upload");
                return upload_message(StatusCode::BAD_REQUEST, "Invalid multipart request");
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(err) => {
                warn!(error = %err, "failed to read upload data");
                return upload_message(StatusCode::BAD_REQUEST, "Failed to read file data");
            }
        };

        let Some(publisher) = &state.publisher else {
            error!(filename = %filename, "upload rejected: no object store configured");
            return upload_message(StatusCode::INTERNAL_SERVER_ERROR, "Upload failed");
        };

        return match publisher.publish(&filename, &data).await {
            Ok(stored) => {
                info!(
                    original = %filename,
                    stored_name = %stored,
                    size = data.len(),
                    "file uploaded"
                );
                Json(UploadResponse {
                    message: format!("File uploaded successfully as {stored}"),
                    stored_name: stored.into_string(),
                })
                .into_response()
            }
            Err(err) => {
                error!(filename = %filename, error = %err, "upload failed");
                upload_message(StatusCode::INTERNAL_SERVER_ERROR, "Upload failed")
            }
        };
    }

    upload_message(StatusCode::BAD_REQUEST, "No file provided")
}
