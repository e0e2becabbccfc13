//! vllm-gateway: thin chat-completion gateway for a vLLM backend.
//!
//! Forwards `/v1/chat/completions` requests to a vLLM server through its
//! OpenAI-compatible completions API, either as a single blocking call or as
//! an SSE stream of escaped text fragments ending in a `[DONE]` sentinel.
//!
//! Inference, sampling, and scheduling all live in the vLLM backend; this
//! crate only owns the request/response contract and the SSE framing.

pub mod client;
pub mod config;
pub mod server;
