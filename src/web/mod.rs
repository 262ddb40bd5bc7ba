//! HTTP surface: the editor page plus a small JSON API.
//!
//! Handlers never fail. Both collaborators (sandbox and tutor) return
//! display-ready text for every outcome, so each endpoint has exactly
//! one response shape.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::sandbox::Sandbox;
use crate::tutor::Tutor;

/// Embedded editor page
const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub sandbox: Arc<Sandbox>,
    pub tutor: Arc<Tutor>,
}

// ── Request / response types ─────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub code: String,
    #[serde(default)]
    pub stdin: String,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub stdout: String,
    pub stderr: String,
    pub feedback: String,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

// ── Handlers ─────────────────────────────────────────────

async fn serve_index() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], INDEX_HTML)
}

/// One trigger: run the code, then ask the tutor about it. The feedback
/// call starts only after the sandbox has fully completed, because it
/// consumes the sandbox's error text.
async fn run_code(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> Json<RunResponse> {
    let run_id = Uuid::new_v4();
    info!(
        %run_id,
        code_bytes = req.code.len(),
        stdin_bytes = req.stdin.len(),
        "run request"
    );

    let result = state.sandbox.execute(&req.code, &req.stdin).await;
    info!(%run_id, error = result.is_error(), "execution finished");

    let error = result.is_error().then_some(result.stderr.as_str());
    let feedback = state.tutor.feedback(&req.code, error).await;

    Json(RunResponse {
        stdout: result.stdout,
        stderr: result.stderr,
        feedback,
    })
}

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let models = state.tutor.list_models().await;
    Json(ModelsResponse { models })
}

// ── Router / server ──────────────────────────────────────

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/run", post(run_code))
        .route("/models", get(list_models));

    Router::new()
        .route("/", get(serve_index))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(CorsLayer::permissive())
}

pub async fn serve(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received, exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SandboxConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt; // for `oneshot`

    fn test_app() -> Router {
        let state = AppState {
            sandbox: Arc::new(Sandbox::new(SandboxConfig::default())),
            tutor: Arc::new(Tutor::new(None)),
        };
        build_router(state)
    }

    fn python_available() -> bool {
        std::process::Command::new("python3")
            .arg("--version")
            .output()
            .is_ok()
    }

    #[tokio::test]
    async fn test_index_is_html() {
        let response = test_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        assert!(std::str::from_utf8(&body).unwrap().contains("<form"));
    }

    #[tokio::test]
    async fn test_run_returns_output_and_feedback() {
        if !python_available() {
            return;
        }
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/run")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"code": "print(2+2)", "stdin": ""}"#))
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["stdout"], "4\n");
        assert_eq!(body["stderr"], "");
        assert_eq!(body["feedback"], crate::tutor::NOT_CONFIGURED);
    }

    #[tokio::test]
    async fn test_run_stdin_field_is_optional() {
        if !python_available() {
            return;
        }
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/run")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"code": "print('hi')"}"#))
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["stdout"], "hi\n");
    }

    #[tokio::test]
    async fn test_models_without_key_is_error_text() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/models")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let models = body["models"].as_array().unwrap();
        assert_eq!(models.len(), 1);
        assert!(models[0]
            .as_str()
            .unwrap()
            .starts_with("Error listing models:"));
    }
}
