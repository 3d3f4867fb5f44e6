//! Shared test fixtures for tool, API, and turn-engine test modules.
//!
//! HTTP tests talk to a throwaway `TcpListener` server instead of a mock
//! crate, and model-driven tests use [`ScriptedModelClient`].

use crate::api::{ModelClient, ResponseEventStream};
use crate::error::ApiError;
use crate::tools::{Tool, ToolName, ToolRegistry};
use crate::types::{
    ModelResponse, OutputItem, ResponseRequest, StreamEvent, TextRequest, ToolCall,
};
use async_trait::async_trait;
use futures_util::stream;
use serde_json::Value;
use futures_util::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

mod http;

pub use http::{
    http_response, json_response, serve_http_replies, serve_http_responses, sse_event_block,
    sse_response, FakeHttpServer, FakeReply, RecordedRequest,
};

// ---------------------------------------------------------------------------
// Scripted model client
// ---------------------------------------------------------------------------

enum ScriptedRound {
    Events(Vec<Result<StreamEvent, String>>),
    OpenFailure(String),
}

/// `ModelClient` that replays scripted rounds and records every request.
#[derive(Default)]
pub struct ScriptedModelClient {
    rounds: Mutex<VecDeque<ScriptedRound>>,
    texts: Mutex<VecDeque<Result<String, String>>>,
    stream_requests: Mutex<Vec<ResponseRequest>>,
    text_requests: Mutex<Vec<TextRequest>>,
}

impl ScriptedModelClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one streamed round-trip.
    pub fn push_round(&self, events: Vec<Result<StreamEvent, String>>) -> &Self {
        self.rounds
            .lock()
            .expect("rounds")
            .push_back(ScriptedRound::Events(events));
        self
    }

    /// Queue a round-trip whose stream cannot even be opened.
    pub fn push_open_failure(&self, message: &str) -> &Self {
        self.rounds
            .lock()
            .expect("rounds")
            .push_back(ScriptedRound::OpenFailure(message.to_string()));
        self
    }

    /// Queue one non-streaming completion result.
    pub fn push_text(&self, result: Result<&str, &str>) -> &Self {
        self.texts
            .lock()
            .expect("texts")
            .push_back(result.map(str::to_string).map_err(str::to_string));
        self
    }

    pub fn stream_requests(&self) -> Vec<ResponseRequest> {
        self.stream_requests.lock().expect("requests").clone()
    }

    pub fn text_requests(&self) -> Vec<TextRequest> {
        self.text_requests.lock().expect("requests").clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn stream_response(
        &self,
        request: &ResponseRequest,
    ) -> Result<ResponseEventStream, ApiError> {
        self.stream_requests
            .lock()
            .expect("requests")
            .push(request.clone());
        let round = self.rounds.lock().expect("rounds").pop_front();
        match round {
            Some(ScriptedRound::Events(events)) => {
                let items = events
                    .into_iter()
                    .map(|event| event.map_err(ApiError::InvalidResponse));
                Ok(stream::iter(items).boxed())
            }
            Some(ScriptedRound::OpenFailure(message)) => Err(ApiError::InvalidResponse(message)),
            None => Err(ApiError::InvalidResponse("no scripted round left".into())),
        }
    }

    async fn create_response(&self, request: &TextRequest) -> Result<String, ApiError> {
        self.text_requests
            .lock()
            .expect("requests")
            .push(request.clone());
        match self.texts.lock().expect("texts").pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ApiError::InvalidResponse(message)),
            None => Err(ApiError::InvalidResponse("no scripted text left".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Event builders
// ---------------------------------------------------------------------------

/// Scripted text delta.
pub fn delta(text: &str) -> Result<StreamEvent, String> {
    Ok(StreamEvent::TextDelta(text.to_string()))
}

/// Scripted function-call announcement (arguments still empty).
pub fn call_added(call_id: &str, name: &str) -> Result<StreamEvent, String> {
    Ok(StreamEvent::OutputItemAdded(OutputItem::FunctionCall(
        ToolCall {
            call_id: call_id.to_string(),
            name: name.to_string(),
            arguments: String::new(),
        },
    )))
}

/// Scripted completion carrying only text.
pub fn completed_text(id: &str, text: &str) -> Result<StreamEvent, String> {
    Ok(StreamEvent::Completed(ModelResponse {
        id: id.to_string(),
        output: vec![OutputItem::Message {
            text: text.to_string(),
        }],
    }))
}

/// Scripted completion requesting the given `(call_id, name, arguments)` calls.
pub fn completed_calls(id: &str, calls: &[(&str, &str, &str)]) -> Result<StreamEvent, String> {
    Ok(StreamEvent::Completed(ModelResponse {
        id: id.to_string(),
        output: calls
            .iter()
            .map(|(call_id, name, arguments)| {
                OutputItem::FunctionCall(ToolCall {
                    call_id: call_id.to_string(),
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                })
            })
            .collect(),
    }))
}

// ---------------------------------------------------------------------------
// Offline tools
// ---------------------------------------------------------------------------

/// Tool answering `<name> <arguments>` without touching the network.
pub struct EchoTool {
    pub name: ToolName,
    pub calls: Arc<Mutex<Vec<Value>>>,
}

impl EchoTool {
    pub fn new(name: ToolName) -> Self {
        Self {
            name,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> ToolName {
        self.name
    }

    async fn execute(&self, arguments: Value) -> String {
        self.calls.lock().expect("calls").push(arguments.clone());
        format!("{} {}", self.name.as_str(), arguments)
    }
}

/// Registry holding an [`EchoTool`] for every tool name.
pub fn echo_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for name in ToolName::ALL {
        registry.register(EchoTool::new(name));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_helpers_emit_expected_wire_format() {
        let block = sse_event_block("response.completed", r#"{"id":"resp_1"}"#);
        assert!(block.starts_with("event: response.completed\n"));
        assert!(block.ends_with("\n\n"));
    }

    #[test]
    fn http_response_sets_content_length() {
        let raw = http_response(200, "application/json", "{}");
        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(raw.contains("Content-Length: 2\r\n"));
        assert!(raw.ends_with("\r\n\r\n{}"));
    }

    #[tokio::test]
    async fn fake_server_records_request_body() {
        let server = serve_http_responses(vec![http_response(200, "text/plain", "ok")]).await;
        let client = reqwest::Client::new();
        let body = client
            .post(format!("{}/echo", server.base_url))
            .body("payload")
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/echo");
        assert_eq!(requests[0].body, "payload");
    }
}
