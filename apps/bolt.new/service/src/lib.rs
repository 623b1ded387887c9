use std::path::Path as FsPath;
use std::sync::Arc;
use std::time::SystemTime;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bolt_app_state::ScriptManifest;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

pub mod auth;
pub mod config;
pub mod web_maud;

use crate::auth::{SessionLoader, non_empty};
use crate::config::Config;
use crate::web_maud::{DocumentPage, render_document};

const SERVICE_NAME: &str = "bolt-web-service";
const CACHE_IMMUTABLE_ONE_YEAR: &str = "public, max-age=31536000, immutable";
const CACHE_SHORT_LIVED: &str = "public, max-age=60";
const CACHE_DOCUMENT: &str = "no-cache, no-store, must-revalidate";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const ROOT_STATIC_FILES: [&str; 3] = [
    "/favicon.svg",
    "/logo-light-styled.png",
    "/logo-dark-styled.png",
];

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    sessions: SessionLoader,
    started_at: SystemTime,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    auth_provider: &'static str,
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    status: &'static str,
    static_dir: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

pub fn build_router(config: Config) -> Router {
    let sessions = SessionLoader::from_config(&config);
    let state = AppState {
        config: Arc::new(config),
        sessions,
        started_at: SystemTime::now(),
    };

    let mut router = Router::new()
        .route("/", get(web_shell_entry))
        .route("/healthz", get(health))
        .route("/readyz", get(readiness))
        .route("/assets/*path", get(static_asset));
    for file in ROOT_STATIC_FILES {
        router = router.route(file, get(static_root_file));
    }

    router
        .route("/*path", get(web_shell_entry))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http()),
        )
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = match state.started_at.elapsed() {
        Ok(duration) => duration.as_secs(),
        Err(_) => 0,
    };

    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds,
        auth_provider: state.sessions.provider_name(),
    })
}

async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let static_dir = state.config.static_dir.to_string_lossy().to_string();

    if state.config.static_dir.is_dir() {
        return (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                static_dir,
            }),
        );
    }

    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ReadinessResponse {
            status: "not_ready",
            static_dir,
        }),
    )
}

async fn web_shell_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let path = uri.path();
    if path == "/api" || path.starts_with("/api/") {
        return Err(not_found(format!("Route '{path}' was not found.")));
    }

    let request_id = request_id(&headers);
    let identity = state.sessions.load(&headers).await;
    debug!(
        request_id = %request_id,
        path,
        authenticated = identity.is_authenticated(),
        "rendering shell document"
    );

    let page = DocumentPage {
        title: state.config.app_title.clone(),
        path: path.to_string(),
        identity,
        affordance: state.config.user_affordance,
        stylesheets: state.config.stylesheets.clone(),
        scripts: ScriptManifest::new(&state.config.script_bundles),
    };
    let document = render_document(&page).map_err(|source| {
        error!(request_id = %request_id, error = %source, "shell document render failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                message: "Failed to render document.".to_string(),
            }),
        )
    })?;

    let mut response = Response::new(Body::from(document));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_DOCUMENT));
    Ok(response)
}

async fn static_asset(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let relative_path = normalize_static_path(&path)
        .ok_or_else(|| not_found(format!("Asset '{path}' was not found.")))?;

    let asset_path = state.config.static_dir.join("assets").join(&relative_path);
    if !asset_path.is_file() {
        return Err(not_found(format!("Asset '{relative_path}' was not found.")));
    }

    let cache_control = if is_hashed_asset_path(&relative_path) {
        CACHE_IMMUTABLE_ONE_YEAR
    } else {
        CACHE_SHORT_LIVED
    };

    build_static_response(&asset_path, cache_control)
        .await
        .map_err(map_static_error)
}

async fn static_root_file(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let relative_path = normalize_static_path(uri.path())
        .ok_or_else(|| not_found(format!("File '{}' was not found.", uri.path())))?;
    build_static_response(&state.config.static_dir.join(relative_path), CACHE_SHORT_LIVED)
        .await
        .map_err(map_static_error)
}

async fn build_static_response(
    file_path: &FsPath,
    cache_control: &'static str,
) -> Result<Response, StaticResponseError> {
    let bytes = tokio::fs::read(file_path).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            StaticResponseError::NotFound(format!(
                "Static file '{}' was not found.",
                file_path.display()
            ))
        } else {
            StaticResponseError::Io(source)
        }
    })?;

    let content_type = mime_guess::from_path(file_path).first_or_octet_stream();
    let mut response = Response::new(Body::from(bytes));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_str(content_type.as_ref())
            .map_err(|_| StaticResponseError::InvalidHeader(content_type.to_string()))?,
    );
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static(cache_control));
    Ok(response)
}

#[derive(Debug, thiserror::Error)]
enum StaticResponseError {
    #[error("{0}")]
    NotFound(String),
    #[error("static file read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid header value '{0}'")]
    InvalidHeader(String),
}

fn map_static_error(error: StaticResponseError) -> (StatusCode, Json<ErrorResponse>) {
    match error {
        StaticResponseError::NotFound(message) => not_found(message),
        StaticResponseError::Io(_) | StaticResponseError::InvalidHeader(_) => {
            error!(%error, "static asset failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    message: "Failed to serve static asset.".to_string(),
                }),
            )
        }
    }
}

fn not_found(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse { message }))
}

fn normalize_static_path(path: &str) -> Option<String> {
    let trimmed = path.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let mut normalized_parts = Vec::new();
    for part in trimmed.split('/') {
        let segment = part.trim();
        if segment.is_empty() || segment == "." || segment == ".." {
            return None;
        }
        normalized_parts.push(segment);
    }

    Some(normalized_parts.join("/"))
}

/// `name-<8+ hex>.ext`, as emitted by the asset pipeline for
/// content-addressed files.
fn is_hashed_asset_path(path: &str) -> bool {
    let Some(stem) = FsPath::new(path)
        .file_stem()
        .and_then(|value| value.to_str())
    else {
        return false;
    };
    let Some((_, hash)) = stem.rsplit_once('-') else {
        return false;
    };
    hash.len() >= 8 && hash.chars().all(|ch| ch.is_ascii_hexdigit())
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| non_empty(value.to_string()))
        .unwrap_or_else(|| format!("req_{}", uuid::Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests;
