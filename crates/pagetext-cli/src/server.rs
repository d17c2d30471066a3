//! HTTP front end: multipart upload and local-path parsing over axum.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use pagetext_core::{parse_bytes, parse_path, ParseError, ParseOptions, ParseResult, ServerConfig};

#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    defaults: ParseOptions,
}

impl AppState {
    pub fn new(config: ServerConfig, defaults: ParseOptions) -> Self {
        Self {
            config: Arc::new(config),
            defaults,
        }
    }
}

struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({"error": self.1}))).into_response()
    }
}

impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        let status = match &err {
            ParseError::Structural(_) | ParseError::Encrypted => StatusCode::UNPROCESSABLE_ENTITY,
            ParseError::NotAFile(_) => StatusCode::BAD_REQUEST,
            ParseError::Io(e) if e.kind() == io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ParseError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError(status, err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError(err.status(), err.body_text())
    }
}

fn bad_request(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::BAD_REQUEST, msg.into())
}

#[derive(Deserialize)]
struct ParseQuery {
    include_pages: Option<bool>,
}

impl ParseQuery {
    fn options(&self, defaults: ParseOptions) -> ParseOptions {
        ParseOptions {
            include_pages: self.include_pages.unwrap_or(defaults.include_pages),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ParsePathRequest {
    path: Option<String>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let limit = state.config.max_upload_bytes;
    Router::new()
        .route("/parse", post(parse_upload_handler))
        .route("/parse-url", post(parse_path_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn parse_upload_handler(
    State(state): State<AppState>,
    Query(query): Query<ParseQuery>,
    mut multipart: Multipart,
) -> Result<Json<ParseResult>, AppError> {
    let options = query.options(state.defaults);

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        upload = Some((filename, data));
        break;
    }

    let Some((filename, data)) = upload else {
        return Err(bad_request("No file field in request"));
    };
    if filename.trim().is_empty() {
        return Err(bad_request("Empty filename"));
    }
    if state.config.require_pdf_extension && !filename.to_lowercase().ends_with(".pdf") {
        return Err(bad_request("Uploaded file must be a PDF"));
    }

    info!("Parsing upload {} ({} bytes)", filename, data.len());
    let result = run_blocking(move || parse_bytes(&data, &options)).await?;
    Ok(Json(result))
}

async fn parse_path_handler(
    State(state): State<AppState>,
    Query(query): Query<ParseQuery>,
    body: Bytes,
) -> Result<Json<ParseResult>, AppError> {
    let options = query.options(state.defaults);

    let request: ParsePathRequest = serde_json::from_slice(&body).unwrap_or_else(|e| {
        debug!("Ignoring unreadable JSON body: {}", e);
        ParsePathRequest::default()
    });
    let Some(path) = request.path.filter(|p| !p.trim().is_empty()) else {
        return Err(bad_request("Missing 'path' in JSON body"));
    };

    info!("Parsing local file {}", path);
    let path = PathBuf::from(path);
    let result = run_blocking(move || parse_path(&path, &options)).await?;
    Ok(Json(result))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Run a parse on the blocking pool so the runtime keeps serving requests.
async fn run_blocking<F>(parse: F) -> Result<ParseResult, AppError>
where
    F: FnOnce() -> pagetext_core::Result<ParseResult> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(parse)
        .await
        .map_err(|e| AppError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))??;
    Ok(result)
}
