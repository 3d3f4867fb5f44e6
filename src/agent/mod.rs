//! Core tool-calling turn loop.
//!
//! [`run_turn`] drives one user turn: it streams a model response, forwards
//! text fragments to the observer as they arrive, executes any tool calls the
//! completed response requests, and chains a follow-up request carrying the
//! tool outputs. The loop ends on the first response that requests no tools.

use crate::api::ModelClient;
use crate::error::{AgentError, ApiError};
use crate::tools::ToolRegistry;
use crate::types::{
    InputItem, Message, ModelResponse, OutputItem, ResponseRequest, StreamEvent, TurnResult,
};
use futures_util::StreamExt;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

mod events;
mod normalization;

pub use events::{FnObserver, NoopObserver, TurnObserver};
use normalization::context_to_input;

/// Per-turn request settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOptions {
    pub model: String,
    pub temperature: Option<f64>,
    /// Opaque tags attached to every request of the turn.
    pub metadata: BTreeMap<String, String>,
}

/// Run one user turn over `context` (system directive plus history).
///
/// Any transport or stream fault aborts the turn immediately; it is never
/// retried here. Tool problems never abort: they become result text.
pub async fn run_turn(
    client: &dyn ModelClient,
    registry: &ToolRegistry,
    options: &TurnOptions,
    context: &[Message],
    observer: &mut (dyn TurnObserver + Send),
) -> Result<TurnResult, AgentError> {
    let tools = registry.definitions();
    let mut input = context_to_input(context);
    let mut previous_response_id: Option<String> = None;
    let mut announced = HashSet::new();
    let mut result = TurnResult::default();

    for round in 1usize.. {
        let request = ResponseRequest {
            model: options.model.clone(),
            input: std::mem::take(&mut input),
            tools: tools.clone(),
            temperature: options.temperature,
            parallel_tool_calls: false,
            previous_response_id: previous_response_id.take(),
            metadata: options.metadata.clone(),
        };
        debug!(round, items = request.input.len(), "model round-trip");

        let response = stream_round(
            client,
            &request,
            observer,
            &mut result.assistant_text,
            &mut announced,
        )
        .await?;

        let calls = response.tool_calls();
        if calls.is_empty() {
            debug!(round, response_id = %response.id, "turn complete");
            break;
        }
        if calls.len() > 1 {
            warn!(
                count = calls.len(),
                "model requested several tool calls at once; running them in order"
            );
        }

        for call in &calls {
            let tool_result = registry.execute(call).await;
            input.push(InputItem::FunctionCallOutput {
                call_id: tool_result.call_id.clone(),
                output: tool_result.output.clone(),
            });
            result.tool_results.push(tool_result);
        }
        previous_response_id = Some(response.id);
    }

    Ok(result)
}

/// Consume one streamed response and return its completed form.
async fn stream_round(
    client: &dyn ModelClient,
    request: &ResponseRequest,
    observer: &mut (dyn TurnObserver + Send),
    text: &mut String,
    announced: &mut HashSet<String>,
) -> Result<ModelResponse, AgentError> {
    let mut stream = client
        .stream_response(request)
        .await
        .map_err(AgentError::Stream)?;

    while let Some(event) = stream.next().await {
        match event.map_err(AgentError::Stream)? {
            StreamEvent::TextDelta(delta) => {
                if delta.is_empty() {
                    continue;
                }
                observer.on_text_delta(&delta);
                text.push_str(&delta);
            }
            StreamEvent::OutputItemAdded(OutputItem::FunctionCall(call)) => {
                if announced.insert(call.name.clone()) {
                    observer.on_tool_name(&call.name);
                }
            }
            StreamEvent::OutputItemAdded(_) => {}
            StreamEvent::Completed(response) => return Ok(response),
        }
    }

    Err(AgentError::Stream(ApiError::InvalidResponse(
        "stream closed before response.completed".into(),
    )))
}
