//! Tool registry for the two lookups the model may request.
//!
//! Every tool is described once by a static [`ToolSpec`]; the JSON schema
//! advertised to the model and the argument validator are both derived from
//! that table, so they cannot drift apart. Execution never fails: any
//! problem becomes the text of the [`ToolResult`].

pub mod country;
pub mod exchange;
pub mod fetch;

use crate::types::{ToolCall, ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

pub use country::CountryInfoTool;
pub use exchange::ExchangeRateTool;

/// Output for tool names outside the registry.
pub const NOT_IMPLEMENTED: &str = "Tool not implemented.";

// ---------------------------------------------------------------------------
// Tool names and declarative specs
// ---------------------------------------------------------------------------

/// Closed set of tools the assistant knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    CountryInfo,
    ExchangeRate,
}

impl ToolName {
    pub const ALL: [ToolName; 2] = [ToolName::CountryInfo, ToolName::ExchangeRate];

    /// Wire name used in function calls.
    pub fn as_str(self) -> &'static str {
        self.spec().name
    }

    /// Resolve a wire name. Unknown names yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|name| name.as_str() == raw)
    }

    /// Declarative description of this tool.
    pub fn spec(self) -> &'static ToolSpec {
        match self {
            Self::CountryInfo => &COUNTRY_INFO_SPEC,
            Self::ExchangeRate => &EXCHANGE_RATE_SPEC,
        }
    }
}

/// One string parameter of a tool.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Minimum length in characters.
    pub min_chars: usize,
    /// Maximum length in characters, if bounded.
    pub max_chars: Option<usize>,
}

impl FieldSpec {
    fn accepts(&self, value: &str) -> bool {
        let len = value.chars().count();
        len >= self.min_chars && self.max_chars.map_or(true, |max| len <= max)
    }
}

/// Static description of a tool: name, description, and ordered fields.
#[derive(Debug)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldSpec],
}

impl ToolSpec {
    /// Strict function definition advertised to the model.
    pub fn definition(&self) -> ToolDefinition {
        let mut properties = Map::new();
        for field in self.fields {
            properties.insert(
                field.name.to_string(),
                json!({ "type": "string", "description": field.description }),
            );
        }
        let required: Vec<&str> = self.fields.iter().map(|field| field.name).collect();
        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
                "additionalProperties": false,
            }),
            strict: true,
        }
    }

    /// Check decoded arguments against the declared fields.
    ///
    /// Rejects non-objects, missing or non-string fields, length violations,
    /// and undeclared fields.
    pub fn validate(&self, arguments: &Value) -> bool {
        let Some(object) = arguments.as_object() else {
            return false;
        };
        if object
            .keys()
            .any(|key| !self.fields.iter().any(|field| field.name == key))
        {
            return false;
        }
        self.fields.iter().all(|field| {
            object
                .get(field.name)
                .and_then(Value::as_str)
                .is_some_and(|value| field.accepts(value))
        })
    }
}

static COUNTRY_INFO_SPEC: ToolSpec = ToolSpec {
    name: "get_country_info",
    description: "Search for country information (capital, population, region, currency, languages). \
                  Use when the user asks about countries. Country name must be in English.",
    fields: &[FieldSpec {
        name: "country_name",
        description: "Country name in English (e.g., 'Brazil', 'United States', 'France')",
        min_chars: 1,
        max_chars: None,
    }],
};

static EXCHANGE_RATE_SPEC: ToolSpec = ToolSpec {
    name: "get_exchange_rate",
    description: "Search for the current exchange rate between two currencies. \
                  Use when the user asks about currency conversion or exchange rate.",
    fields: &[
        FieldSpec {
            name: "base_currency",
            description: "Base currency code (e.g., 'USD', 'BRL', 'EUR')",
            min_chars: 3,
            max_chars: Some(3),
        },
        FieldSpec {
            name: "target_currency",
            description: "Target currency code (e.g., 'BRL', 'USD', 'EUR')",
            min_chars: 3,
            max_chars: Some(3),
        },
    ],
};

/// Output for a payload that is not valid JSON.
pub fn invalid_json_output(name: &str) -> String {
    format!("Error: Invalid JSON arguments for {name}")
}

/// Output for JSON that does not match the tool's fields.
pub fn invalid_params_output(name: &str) -> String {
    format!("Error: Invalid parameters for {name}")
}

// ---------------------------------------------------------------------------
// Tool trait
// ---------------------------------------------------------------------------

/// A tool that can be invoked by the model.
///
/// The registry validates arguments against [`Tool::name`]'s spec before
/// calling [`Tool::execute`], so implementations only deserialize into their
/// typed argument struct.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Which spec entry this tool implements.
    fn name(&self) -> ToolName;

    /// Run the tool with already-validated arguments and return its text.
    async fn execute(&self, arguments: Value) -> String;
}

// ---------------------------------------------------------------------------
// Tool registry
// ---------------------------------------------------------------------------

/// Registry of available tools.
///
/// The turn engine advertises [`ToolRegistry::definitions`] to the API and
/// dispatches tool calls through [`ToolRegistry::execute`].
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry with both lookups wired to the configured endpoints.
    pub fn with_defaults(country: CountryInfoTool, exchange: ExchangeRateTool) -> Self {
        let mut registry = Self::new();
        registry.register(country);
        registry.register(exchange);
        registry
    }

    /// Register a tool. A later registration for the same name wins.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.retain(|existing| existing.name() != tool.name());
        self.tools.push(Box::new(tool));
    }

    /// Tool definitions for the API request, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| tool.name().spec().definition())
            .collect()
    }

    /// Execute one call. Never fails; problems are reported as output text.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let output = self.dispatch(call).await;
        ToolResult {
            call_id: call.call_id.clone(),
            name: call.name.clone(),
            output,
        }
    }

    async fn dispatch(&self, call: &ToolCall) -> String {
        let Some(tool) = ToolName::parse(&call.name)
            .and_then(|name| self.tools.iter().find(|tool| tool.name() == name))
        else {
            warn!(tool = %call.name, "model requested an unknown tool");
            return NOT_IMPLEMENTED.to_string();
        };

        // Models sometimes send an empty payload for "no arguments".
        let raw = if call.arguments.trim().is_empty() {
            "{}"
        } else {
            call.arguments.as_str()
        };
        let arguments: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                debug!(tool = %call.name, error = %err, "tool arguments are not JSON");
                return invalid_json_output(&call.name);
            }
        };
        if !tool.name().spec().validate(&arguments) {
            debug!(tool = %call.name, "tool arguments failed validation");
            return invalid_params_output(&call.name);
        }

        debug!(tool = %call.name, call_id = %call.call_id, "executing tool");
        tool.execute(arguments).await
    }

    /// True if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
