//! Log-download HTTP surface.

use std::path::PathBuf;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::warn;

use trunkline_metrics::latest_log_file;

#[derive(Clone)]
struct AppState {
    log_dir: PathBuf,
}

/// Builds the application router with all routes.
pub fn app(log_dir: impl Into<PathBuf>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/download-logs", get(download_logs))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState {
            log_dir: log_dir.into(),
        })
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Serves the most recently written log CSV as a download, or a JSON
/// message when no log exists yet.
async fn download_logs(State(state): State<AppState>) -> Response {
    let Some(path) = latest_log_file(&state.log_dir) else {
        return Json(json!({ "message": "No logs available" })).into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "log.csv".to_string());
            (
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", file_name),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read log file");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Failed to read log file" })),
            )
                .into_response()
        }
    }
}
