//! HTTP client for the OpenAI Responses API.
//!
//! The API layer is split into cohesive parts:
//! - `client`: auth headers, status handling, and transport
//! - `responses`: `/responses` payload building and event parsing
//! - `sse`: incremental server-sent-events decoding

use crate::error::ApiError;
use crate::types::{ResponseRequest, StreamEvent, TextRequest};
use async_trait::async_trait;
use futures_core::Stream;
use std::pin::Pin;

mod client;
mod responses;
mod sse;

pub use client::ApiClient;
pub use sse::SseDecoder;

/// Events of one streamed response, in arrival order.
pub type ResponseEventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ApiError>> + Send>>;

/// Minimal model API interface used by the turn engine and the compactor.
///
/// This trait lets tests provide deterministic scripted responses without
/// network calls while the production path uses [`ApiClient`].
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Open a streamed response. Errors after opening arrive as stream items.
    async fn stream_response(&self, request: &ResponseRequest)
        -> Result<ResponseEventStream, ApiError>;

    /// Run a single non-streamed prompt and return its trimmed output text.
    async fn create_response(&self, request: &TextRequest) -> Result<String, ApiError>;
}
