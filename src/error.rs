//! Unified error types for the assistant.
//!
//! Tool failures never appear here: tools report problems as text inside
//! their [`ToolResult`](crate::types::ToolResult) so a turn keeps running.

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
    /// `OPENAI_API_KEY` was not set and no key was configured.
    MissingApiKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
            Self::MissingApiKey => write!(f, "OPENAI_API_KEY not found"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors from the model API layer.
#[derive(Debug)]
pub enum ApiError {
    /// Network / reqwest-level error, including timeouts.
    Http(reqwest::Error),
    /// Non-2xx status from the API.
    Status { code: u16, body: String },
    /// The provider answered with something we could not interpret, or the
    /// stream reported a failure.
    InvalidResponse(String),
}

impl ApiError {
    /// HTTP status code, when the failure was a non-2xx answer.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            Self::Http(inner) => inner.status().map(|status| status.as_u16()),
            Self::InvalidResponse(_) => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status { code, body } => write!(f, "status {code}: {body}"),
            Self::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Errors from the persistent conversation store.
#[derive(Debug)]
pub enum StoreError {
    /// The session does not exist or is not owned by the calling user.
    SessionNotFound,
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    LockPoisoned,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionNotFound => write!(f, "session not found for user"),
            Self::Sqlite(e) => write!(f, "sqlite: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
            Self::LockPoisoned => write!(f, "store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// AgentError
// ---------------------------------------------------------------------------

/// Turn-level failure of the tool-calling loop.
#[derive(Debug)]
pub enum AgentError {
    /// The streaming model call failed; the turn is abandoned without retry.
    Stream(ApiError),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream(e) => write!(f, "stream failed: {e}"),
        }
    }
}

impl std::error::Error for AgentError {}

// ---------------------------------------------------------------------------
// ConversationError (top-level)
// ---------------------------------------------------------------------------

/// Error surfaced by [`ConversationService`](crate::conversation::ConversationService).
#[derive(Debug)]
pub enum ConversationError {
    Store(StoreError),
    Agent(AgentError),
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Agent(e) => write!(f, "agent: {e}"),
        }
    }
}

impl std::error::Error for ConversationError {}

impl From<StoreError> for ConversationError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<AgentError> for ConversationError {
    fn from(e: AgentError) -> Self {
        Self::Agent(e)
    }
}

// ---------------------------------------------------------------------------
// ReplError
// ---------------------------------------------------------------------------

/// Failure of the interactive prompts around the chat loop.
#[derive(Debug)]
pub enum ReplError {
    /// Reading the terminal failed.
    Io(std::io::Error),
    Store(StoreError),
}

impl fmt::Display for ReplError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
        }
    }
}

impl std::error::Error for ReplError {}

impl From<std::io::Error> for ReplError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<StoreError> for ReplError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
