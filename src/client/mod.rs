//! OpenAI-compatible client for the vLLM backend.
//!
//! - [`vllm`]: the `CompletionClient` trait and its reqwest-based implementation
//! - [`sse`]: incremental parser for the upstream SSE byte stream

pub mod sse;
pub mod vllm;
