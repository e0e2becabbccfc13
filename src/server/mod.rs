//! HTTP server exposing the chat-completion endpoint.
//!
//! - [`api`]: Request/response types and route handlers
//! - [`streaming`]: SSE framing for token-by-token responses

pub mod api;
pub mod streaming;
