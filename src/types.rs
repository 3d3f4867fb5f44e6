//! Shared data model: stored messages, tool calls, and the `/responses`
//! request/stream shapes the turn engine speaks.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Message roles
// ---------------------------------------------------------------------------

/// Conversation participant role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction message.
    System,
    /// End-user message.
    User,
    /// Assistant/model message.
    Assistant,
    /// Tool execution result message.
    Tool,
}

impl Role {
    /// Wire/storage spelling of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }

    /// Parse the storage spelling back into a role.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            "tool" => Some(Self::Tool),
            _ => None,
        }
    }

    /// Human-facing label used in summarization transcripts.
    pub fn label(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::User => "User",
            Self::Assistant => "Assistant",
            Self::Tool => "Tool",
        }
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// One entry of a session's turn log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Name of the tool that produced this message (tool role only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Correlation id of the tool call this message answers (tool role only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_name: None,
            tool_call_id: None,
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Create a tool output message bound to a tool call.
    pub fn tool(
        name: impl Into<String>,
        call_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_name: Some(name.into()),
            tool_call_id: Some(call_id.into()),
        }
    }

    /// Non-empty tool-call correlation id, if any.
    pub fn call_id(&self) -> Option<&str> {
        self.tool_call_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// Function tool advertised to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema object describing the parameters.
    pub parameters: Value,
    /// Reject undeclared fields.
    pub strict: bool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub call_id: String,
    pub name: String,
    /// Raw JSON-encoded argument payload, not yet validated.
    pub arguments: String,
}

/// Outcome of executing a [`ToolCall`]. Always textual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    pub output: String,
}

/// Everything one user turn produced, across all round-trips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnResult {
    pub assistant_text: String,
    pub tool_results: Vec<ToolResult>,
}

// ---------------------------------------------------------------------------
// Model requests
// ---------------------------------------------------------------------------

/// One input item of a `/responses` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputItem {
    /// Plain role/content message.
    Message { role: Role, content: String },
    /// Output of a tool call, bound to the call id of the previous response.
    FunctionCallOutput { call_id: String, output: String },
}

/// Streaming `/responses` request issued once per round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRequest {
    pub model: String,
    pub input: Vec<InputItem>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: Option<f64>,
    pub parallel_tool_calls: bool,
    /// Continuation reference to the response this request builds on.
    pub previous_response_id: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

/// Non-streaming single-prompt request (used for summarization).
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub model: String,
    pub input: String,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub metadata: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Model responses
// ---------------------------------------------------------------------------

/// One output item of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputItem {
    /// Assistant message text.
    Message { text: String },
    /// Function tool call.
    FunctionCall(ToolCall),
    /// Any other item kind (reasoning, web search, ...), kept by type name.
    Other(String),
}

/// Final materialized response of one round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    /// Stable id used as the continuation reference for follow-ups.
    pub id: String,
    pub output: Vec<OutputItem>,
}

impl ModelResponse {
    /// Completed tool-call requests, in output order.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::FunctionCall(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Incremental event emitted while a response streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Fragment of assistant text.
    TextDelta(String),
    /// A new output item was announced (tool calls arrive with empty args).
    OutputItemAdded(OutputItem),
    /// The response finished; always the last event of a healthy stream.
    Completed(ModelResponse),
}
