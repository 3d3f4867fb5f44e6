use super::sse::SseDecoder;
use super::ResponseEventStream;
use crate::error::ApiError;
use crate::types::{
    InputItem, ModelResponse, OutputItem, ResponseRequest, StreamEvent, TextRequest, ToolCall,
};
use async_stream::try_stream;
use futures_util::StreamExt;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

pub(crate) fn build_stream_payload(request: &ResponseRequest) -> Value {
    let input: Vec<Value> = request.input.iter().map(input_item_to_wire).collect();

    let mut payload = Map::new();
    payload.insert("model".to_string(), Value::String(request.model.clone()));
    payload.insert("input".to_string(), Value::Array(input));
    if !request.tools.is_empty() {
        let tools = request
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                    "strict": tool.strict,
                })
            })
            .collect::<Vec<_>>();
        payload.insert("tools".to_string(), Value::Array(tools));
    }
    if let Some(temperature) = request.temperature {
        payload.insert("temperature".to_string(), Value::from(temperature));
    }
    payload.insert(
        "parallel_tool_calls".to_string(),
        Value::Bool(request.parallel_tool_calls),
    );
    if let Some(previous) = request
        .previous_response_id
        .as_deref()
        .filter(|id| !id.is_empty())
    {
        payload.insert(
            "previous_response_id".to_string(),
            Value::String(previous.to_string()),
        );
    }
    if let Some(metadata) = metadata_to_wire(&request.metadata) {
        payload.insert("metadata".to_string(), metadata);
    }
    payload.insert("stream".to_string(), Value::Bool(true));
    Value::Object(payload)
}

pub(crate) fn build_text_payload(request: &TextRequest) -> Value {
    let mut payload = Map::new();
    payload.insert("model".to_string(), Value::String(request.model.clone()));
    payload.insert("input".to_string(), Value::String(request.input.clone()));
    if let Some(temperature) = request.temperature {
        payload.insert("temperature".to_string(), Value::from(temperature));
    }
    if let Some(max) = request.max_output_tokens {
        payload.insert("max_output_tokens".to_string(), Value::from(max));
    }
    if let Some(metadata) = metadata_to_wire(&request.metadata) {
        payload.insert("metadata".to_string(), metadata);
    }
    Value::Object(payload)
}

fn input_item_to_wire(item: &InputItem) -> Value {
    match item {
        InputItem::Message { role, content } => json!({
            "role": role.as_str(),
            "content": content,
        }),
        InputItem::FunctionCallOutput { call_id, output } => json!({
            "type": "function_call_output",
            "call_id": call_id,
            "output": output,
        }),
    }
}

fn metadata_to_wire(metadata: &BTreeMap<String, String>) -> Option<Value> {
    if metadata.is_empty() {
        return None;
    }
    let map = metadata
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect::<Map<_, _>>();
    Some(Value::Object(map))
}

// ---------------------------------------------------------------------------
// Streaming events
// ---------------------------------------------------------------------------

/// Turn a streamed HTTP body into typed events as bytes arrive.
pub(crate) fn event_stream(response: reqwest::Response) -> ResponseEventStream {
    Box::pin(try_stream! {
        let mut chunks = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(ApiError::from)?;
            for payload in decoder.push(&chunk) {
                if let Some(event) = parse_stream_event(&payload)? {
                    yield event;
                }
            }
        }
        for payload in decoder.finish() {
            if let Some(event) = parse_stream_event(&payload)? {
                yield event;
            }
        }
    })
}

/// Map one SSE `data` payload to an event. Unneeded event kinds yield `None`.
pub(crate) fn parse_stream_event(payload: &str) -> Result<Option<StreamEvent>, ApiError> {
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }
    let event: Value = serde_json::from_str(payload).map_err(|err| {
        ApiError::InvalidResponse(format!("invalid streaming event payload: {err}"))
    })?;

    match event.get("type").and_then(Value::as_str).unwrap_or_default() {
        "response.output_text.delta" => Ok(event
            .get("delta")
            .and_then(Value::as_str)
            .filter(|delta| !delta.is_empty())
            .map(|delta| StreamEvent::TextDelta(delta.to_string()))),
        "response.output_item.added" => Ok(event
            .get("item")
            .map(|item| StreamEvent::OutputItemAdded(parse_output_item(item, 0)))),
        "response.completed" => {
            let response = event.get("response").ok_or_else(|| {
                ApiError::InvalidResponse("response.completed without response".to_string())
            })?;
            Ok(Some(StreamEvent::Completed(parse_response(response)?)))
        }
        "response.failed" | "response.incomplete" => {
            let kind = event.get("type").and_then(Value::as_str).unwrap_or_default();
            let response = event.get("response");
            let message = response
                .and_then(|r| r.get("error"))
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .or_else(|| {
                    response
                        .and_then(|r| r.get("incomplete_details"))
                        .and_then(|details| details.get("reason"))
                        .and_then(Value::as_str)
                })
                .unwrap_or("no details");
            Err(ApiError::InvalidResponse(format!("{kind}: {message}")))
        }
        "error" => {
            let message = event
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| {
                    event
                        .get("error")
                        .and_then(|error| error.get("message"))
                        .and_then(Value::as_str)
                })
                .unwrap_or("error event received");
            Err(ApiError::InvalidResponse(format!(
                "stream error event: {message}"
            )))
        }
        _ => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Materialize a complete response object.
pub(crate) fn parse_response(payload: &Value) -> Result<ModelResponse, ApiError> {
    let id = payload
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::InvalidResponse("response without id".to_string()))?
        .to_string();
    let output = payload
        .get("output")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(index, item)| parse_output_item(item, index))
                .collect()
        })
        .unwrap_or_default();
    Ok(ModelResponse { id, output })
}

/// Text of a non-streamed response: `output_text` when present, else the
/// concatenated message parts. Trimmed.
pub(crate) fn extract_output_text(payload: &Value) -> String {
    if let Some(text) = payload
        .get("output_text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
    {
        return text.to_string();
    }
    let mut text = String::new();
    if let Some(items) = payload.get("output").and_then(Value::as_array) {
        for item in items {
            if item.get("type").and_then(Value::as_str) == Some("message") {
                text.push_str(&message_text(item));
            }
        }
    }
    text.trim().to_string()
}

fn parse_output_item(item: &Value, index: usize) -> OutputItem {
    match item.get("type").and_then(Value::as_str).unwrap_or_default() {
        "message" => OutputItem::Message {
            text: message_text(item),
        },
        "function_call" => {
            let name = item
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string();
            let call_id = item
                .get("call_id")
                .and_then(Value::as_str)
                .or_else(|| item.get("id").and_then(Value::as_str))
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("call_{index}"));
            let arguments = match item.get("arguments") {
                Some(Value::String(text)) => text.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            OutputItem::FunctionCall(ToolCall {
                call_id,
                name,
                arguments,
            })
        }
        other => OutputItem::Other(other.to_string()),
    }
}

fn message_text(item: &Value) -> String {
    let Some(content) = item.get("content").and_then(Value::as_array) else {
        return String::new();
    };
    content
        .iter()
        .filter(|part| {
            matches!(
                part.get("type").and_then(Value::as_str),
                Some("output_text" | "text")
            )
        })
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, ToolDefinition};

    fn request() -> ResponseRequest {
        ResponseRequest {
            model: "gpt-4.1-mini".to_string(),
            input: vec![
                InputItem::Message {
                    role: Role::System,
                    content: "be brief".into(),
                },
                InputItem::Message {
                    role: Role::User,
                    content: "hi".into(),
                },
            ],
            tools: vec![ToolDefinition {
                name: "get_country_info".into(),
                description: "lookup".into(),
                parameters: json!({"type": "object"}),
                strict: true,
            }],
            temperature: Some(0.5),
            parallel_tool_calls: false,
            previous_response_id: None,
            metadata: BTreeMap::from([("sessionId".to_string(), "7".to_string())]),
        }
    }

    #[test]
    fn stream_payload_carries_turn_settings() {
        let payload = build_stream_payload(&request());
        assert_eq!(payload["model"], "gpt-4.1-mini");
        assert_eq!(payload["stream"], true);
        assert_eq!(payload["parallel_tool_calls"], false);
        assert_eq!(payload["temperature"], 0.5);
        assert_eq!(payload["metadata"]["sessionId"], "7");
        assert!(payload.get("previous_response_id").is_none());
        assert_eq!(payload["input"][0]["role"], "system");
        assert_eq!(payload["input"][1]["content"], "hi");
        assert_eq!(payload["tools"][0]["type"], "function");
        assert_eq!(payload["tools"][0]["strict"], true);
    }

    #[test]
    fn stream_payload_chains_tool_outputs() {
        let mut req = request();
        req.input = vec![InputItem::FunctionCallOutput {
            call_id: "call_1".into(),
            output: "ok".into(),
        }];
        req.previous_response_id = Some("resp_1".into());
        let payload = build_stream_payload(&req);
        assert_eq!(payload["previous_response_id"], "resp_1");
        assert_eq!(payload["input"][0]["type"], "function_call_output");
        assert_eq!(payload["input"][0]["call_id"], "call_1");
        assert_eq!(payload["input"][0]["output"], "ok");
    }

    #[test]
    fn text_payload_sets_budget() {
        let payload = build_text_payload(&TextRequest {
            model: "m".into(),
            input: "summarize".into(),
            temperature: Some(0.3),
            max_output_tokens: Some(700),
            metadata: BTreeMap::new(),
        });
        assert_eq!(payload["input"], "summarize");
        assert_eq!(payload["max_output_tokens"], 700);
        assert!(payload.get("metadata").is_none());
        assert!(payload.get("stream").is_none());
    }

    #[test]
    fn parses_text_delta() {
        let event =
            parse_stream_event(r#"{"type":"response.output_text.delta","delta":"Par"}"#).unwrap();
        assert_eq!(event, Some(StreamEvent::TextDelta("Par".into())));
    }

    #[test]
    fn parses_function_call_announcement() {
        let event = parse_stream_event(
            r#"{"type":"response.output_item.added","item":{"type":"function_call","id":"fc_1","call_id":"call_1","name":"get_country_info","arguments":""}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            Some(StreamEvent::OutputItemAdded(OutputItem::FunctionCall(
                ToolCall {
                    call_id: "call_1".into(),
                    name: "get_country_info".into(),
                    arguments: String::new(),
                }
            )))
        );
    }

    #[test]
    fn parses_completed_response() {
        let event = parse_stream_event(
            r#"{"type":"response.completed","response":{"id":"resp_9","output":[
                {"type":"reasoning","summary":[]},
                {"type":"function_call","call_id":"call_2","name":"get_exchange_rate","arguments":"{\"base_currency\":\"USD\",\"target_currency\":\"BRL\"}"},
                {"type":"message","content":[{"type":"output_text","text":"Hi"}]}
            ]}}"#,
        )
        .unwrap();
        let Some(StreamEvent::Completed(response)) = event else {
            panic!("expected completed event");
        };
        assert_eq!(response.id, "resp_9");
        assert_eq!(response.output[0], OutputItem::Other("reasoning".into()));
        let calls = response.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "get_exchange_rate");
        assert!(calls[0].arguments.contains("USD"));
        assert_eq!(
            response.output[2],
            OutputItem::Message { text: "Hi".into() }
        );
    }

    #[test]
    fn failure_events_are_errors() {
        let err = parse_stream_event(
            r#"{"type":"response.failed","response":{"error":{"message":"overloaded"}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("overloaded"), "got: {err}");

        let err = parse_stream_event(r#"{"type":"error","message":"bad key"}"#).unwrap_err();
        assert!(err.to_string().contains("bad key"), "got: {err}");
    }

    #[test]
    fn ignores_unneeded_events_and_done_marker() {
        assert_eq!(
            parse_stream_event(r#"{"type":"response.created","response":{}}"#).unwrap(),
            None
        );
        assert_eq!(parse_stream_event("[DONE]").unwrap(), None);
        assert!(parse_stream_event("{oops").is_err());
    }

    #[test]
    fn completed_without_id_is_invalid() {
        let err = parse_stream_event(r#"{"type":"response.completed","response":{"output":[]}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("without id"));
    }

    #[test]
    fn output_text_prefers_aggregate_field() {
        assert_eq!(
            extract_output_text(&json!({"output_text": "  summary  "})),
            "summary"
        );
        let body = json!({"output": [
            {"type": "reasoning"},
            {"type": "message", "content": [
                {"type": "output_text", "text": "part one, "},
                {"type": "output_text", "text": "part two"}
            ]}
        ]});
        assert_eq!(extract_output_text(&body), "part one, part two");
        assert_eq!(extract_output_text(&json!({})), "");
    }
}
