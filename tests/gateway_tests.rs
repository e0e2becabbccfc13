//! Integration tests for the full gateway pipeline.
//!
//! Serves the real router on an ephemeral port with a stub backend and
//! drives it over HTTP, the way a caller would.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::stream;
use tokio::net::TcpListener;

use vllm_gateway::client::vllm::{
    ClientError, CompletionClient, FragmentStream, SamplingParams,
};
use vllm_gateway::config::Config;
use vllm_gateway::server::api::{build_router, AppState, GeneratedDoc};

/// Backend stub: fixed reply for `generate`, canned fragments for `stream`.
struct StubBackend {
    reply: String,
    fragments: Vec<String>,
}

#[async_trait]
impl CompletionClient for StubBackend {
    async fn generate(
        &self,
        _prompt: &str,
        _params: &SamplingParams,
    ) -> Result<String, ClientError> {
        Ok(self.reply.clone())
    }

    async fn stream(
        &self,
        _prompt: &str,
        _params: &SamplingParams,
    ) -> Result<FragmentStream, ClientError> {
        let items: Vec<Result<String, ClientError>> =
            self.fragments.iter().cloned().map(Ok).collect();
        Ok(Box::pin(stream::iter(items)))
    }
}

async fn spawn_gateway(backend: StubBackend) -> String {
    let state = Arc::new(AppState {
        client: Arc::new(backend),
        config: Arc::new(Config::default()),
        start_time: Instant::now(),
    });
    let app = build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_blocking_completion() {
    let base = spawn_gateway(StubBackend {
        reply: "42".to_string(),
        fragments: vec![],
    })
    .await;

    let doc: GeneratedDoc = reqwest::Client::new()
        .post(format!("{base}/v1/chat/completions"))
        .json(&serde_json::json!({ "query": "What is 6*7?", "streaming": false }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(doc.text, "42");
    assert_eq!(doc.prompt, "What is 6*7?");
}

#[tokio::test]
async fn test_streaming_completion() {
    let fragments = vec!["The", " ", "answer", "\n", "is 42"];
    let base = spawn_gateway(StubBackend {
        reply: String::new(),
        fragments: fragments.into_iter().map(String::from).collect(),
    })
    .await;

    let response = reqwest::Client::new()
        .post(format!("{base}/v1/chat/completions"))
        .json(&serde_json::json!({ "query": "q", "streaming": true }))
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let body = response.text().await.unwrap();
    assert_eq!(
        body,
        "data: The\n\ndata: @#$\n\ndata: answer\n\ndata: <br/>\n\ndata: is@#$42\n\ndata: [DONE]\n\n"
    );
}

#[tokio::test]
async fn test_streaming_stops_at_eos_marker() {
    let fragments = vec!["Hello", " world</s>", "never sent"];
    let base = spawn_gateway(StubBackend {
        reply: String::new(),
        fragments: fragments.into_iter().map(String::from).collect(),
    })
    .await;

    let body = reqwest::Client::new()
        .post(format!("{base}/v1/chat/completions"))
        .json(&serde_json::json!({ "query": "q", "streaming": true }))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(!body.contains("never sent"));
    assert!(!body.contains("</s>"));
    assert!(body.ends_with("data: [DONE]\n\n"));
    assert_eq!(body.matches("data: [DONE]").count(), 1);
}

#[tokio::test]
async fn test_health() {
    let base = spawn_gateway(StubBackend {
        reply: String::new(),
        fragments: vec![],
    })
    .await;

    let response = reqwest::Client::new()
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}
