//! `CompletionClient` trait and the reqwest-based vLLM implementation.
//!
//! The backend speaks the OpenAI completions API at `<api_base>/completions`.
//! Failures carry no retry or backoff policy: the gateway is a thin
//! forwarding layer and surfaces client errors to its caller unchanged.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::client::sse::SseParser;
use crate::config::Config;

/// vLLM ignores authentication but the OpenAI surface requires a credential.
const DUMMY_API_KEY: &str = "EMPTY";

/// Sampling parameters forwarded verbatim to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub max_new_tokens: u32,
    pub top_p: f64,
    pub temperature: f64,
    pub repetition_penalty: f64,
}

/// Errors from the backend client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to vLLM backend failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("vLLM backend returned {status}: {body}")]
    Upstream {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed stream chunk: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("vLLM backend returned no choices")]
    NoChoices,
}

/// Incremental text fragments in backend delivery order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// A completion backend: one blocking call, or a stream of fragments.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate the full completion for `prompt` in one call.
    async fn generate(&self, prompt: &str, params: &SamplingParams)
        -> Result<String, ClientError>;

    /// Stream completion fragments for `prompt` as the backend produces them.
    ///
    /// Dropping the returned stream stops consumption and releases the
    /// underlying connection.
    async fn stream(&self, prompt: &str, params: &SamplingParams)
        -> Result<FragmentStream, ClientError>;
}

// ─── Wire Types ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequestBody<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    // The backend exposes repetition penalty through the OpenAI
    // presence_penalty field.
    presence_penalty: f64,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponseBody {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

// ─── Client ────────────────────────────────────────────────────────────────

/// reqwest-based client for the vLLM OpenAI-compatible API.
pub struct VllmClient {
    http: reqwest::Client,
    api_base: String,
    model: String,
}

impl VllmClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base(),
            model: config.model_id.clone(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/completions", self.api_base)
    }

    async fn post_completion(
        &self,
        prompt: &str,
        params: &SamplingParams,
        stream: bool,
    ) -> Result<reqwest::Response, ClientError> {
        let body = CompletionRequestBody {
            model: &self.model,
            prompt,
            max_tokens: params.max_new_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            presence_penalty: params.repetition_penalty,
            stream,
        };

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(DUMMY_API_KEY)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::Upstream { status, body })
        }
    }
}

#[async_trait]
impl CompletionClient for VllmClient {
    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<String, ClientError> {
        let response = self.post_completion(prompt, params, false).await?;
        let body: CompletionResponseBody = response.json().await?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or(ClientError::NoChoices)
    }

    async fn stream(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<FragmentStream, ClientError> {
        let response = self.post_completion(prompt, params, true).await?;
        let mut bytes = response.bytes_stream();

        // Bounded channel: one fragment in flight, the reader paces the
        // upstream connection.
        let (tx, rx) = mpsc::channel::<Result<String, ClientError>>(1);

        tokio::spawn(async move {
            let mut parser = SseParser::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(Err(ClientError::Http(e))).await;
                        return;
                    }
                };

                for payload in parser.push(&chunk) {
                    if payload == "[DONE]" {
                        return;
                    }
                    match serde_json::from_str::<CompletionResponseBody>(&payload) {
                        Ok(body) => {
                            let text = body
                                .choices
                                .into_iter()
                                .next()
                                .map(|choice| choice.text)
                                .unwrap_or_default();
                            if tx.send(Ok(text)).await.is_err() {
                                // Receiver dropped, stop consuming.
                                return;
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(Err(ClientError::Decode(e))).await;
                            return;
                        }
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
