//! Chat-completion HTTP API.
//!
//! Implements the gateway surface:
//! - POST /v1/chat/completions
//! - GET /health

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::client::vllm::{CompletionClient, SamplingParams};
use crate::config::Config;
use crate::server::streaming::completion_sse_stream;

/// Application state shared across handlers.
pub struct AppState {
    pub client: Arc<dyn CompletionClient>,
    pub config: Arc<Config>,
    pub start_time: Instant,
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

/// Chat completion request.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f64,
    #[serde(default)]
    pub streaming: bool,
}

fn default_max_new_tokens() -> u32 {
    1024
}
fn default_top_p() -> f64 {
    0.95
}
fn default_temperature() -> f64 {
    0.01
}
fn default_repetition_penalty() -> f64 {
    1.03
}

/// Non-streaming response: the generated text plus the prompt it answers.
#[derive(Debug, Serialize, Deserialize)]
pub struct GeneratedDoc {
    pub text: String,
    pub prompt: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Response, StatusCode> {
    let request_id = Uuid::new_v4().to_string();

    info!(
        request_id = request_id,
        model = state.config.model_id,
        streaming = req.streaming,
        max_new_tokens = req.max_new_tokens,
        "Chat completion request"
    );

    let params = SamplingParams {
        max_new_tokens: req.max_new_tokens,
        top_p: req.top_p,
        temperature: req.temperature,
        repetition_penalty: req.repetition_penalty,
    };

    if req.streaming {
        let fragments = state.client.stream(&req.query, &params).await.map_err(|e| {
            error!(request_id = request_id, "Backend stream failed: {e}");
            StatusCode::BAD_GATEWAY
        })?;

        // A backend error mid-stream aborts the body; the status line has
        // already been sent at that point.
        Response::builder()
            .header(header::CONTENT_TYPE, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-cache")
            .body(Body::from_stream(completion_sse_stream(fragments)))
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    } else {
        let text = state.client.generate(&req.query, &params).await.map_err(|e| {
            error!(request_id = request_id, "Backend generate failed: {e}");
            StatusCode::BAD_GATEWAY
        })?;

        Ok(Json(GeneratedDoc {
            text,
            prompt: req.query,
        })
        .into_response())
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
