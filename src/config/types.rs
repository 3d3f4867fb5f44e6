use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_COUNTRY_API_BASE_URL, DEFAULT_DB_PATH,
    DEFAULT_EXCHANGE_API_BASE_URL, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MODEL_ID,
    DEFAULT_RETRY_DELAY_MS, DEFAULT_SUMMARY_TOKEN_TARGET, DEFAULT_SUMMARY_TRIGGER_TOKENS,
    DEFAULT_TEMPERATURE,
};

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api: ApiConfig,
    pub model: ModelConfig,
    pub storage: StorageConfig,
    pub memory: MemoryConfig,
    pub network: NetworkConfig,
    pub tools: ToolsConfig,
}

/// Provider endpoint and credentials.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Usually supplied through `OPENAI_API_KEY` rather than the file.
    pub api_key: String,
    /// Optional `OpenAI-Project` header value.
    pub project_id: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.into(),
            api_key: String::new(),
            project_id: None,
        }
    }
}

/// Model selection and sampling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub temperature: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL_ID.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Conversation database location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

/// History compaction thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Approximate summary length, also the summary's output-token cap.
    pub summary_token_target: u32,
    /// Stored-history token count that triggers compaction.
    pub summary_trigger_tokens: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            summary_token_target: DEFAULT_SUMMARY_TOKEN_TARGET,
            summary_trigger_tokens: DEFAULT_SUMMARY_TRIGGER_TOKENS,
        }
    }
}

/// Network/HTTP timeout policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Timeout for model API requests, including the whole response stream.
    pub api_timeout_secs: u64,
    /// Timeout for each tool lookup attempt.
    pub fetch_timeout_secs: u64,
    /// Pause before retrying a failed tool lookup.
    pub retry_delay_ms: u64,
}

impl NetworkConfig {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

/// Endpoints used by the lookup tools.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub country_api_base_url: String,
    pub exchange_api_base_url: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            country_api_base_url: DEFAULT_COUNTRY_API_BASE_URL.into(),
            exchange_api_base_url: DEFAULT_EXCHANGE_API_BASE_URL.into(),
        }
    }
}

/// On-disk shape of `mundi.toml`. Every section and key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct FileConfig {
    pub(super) api: ApiConfig,
    pub(super) model: ModelConfig,
    pub(super) storage: StorageConfig,
    pub(super) memory: MemoryConfig,
    pub(super) network: NetworkConfig,
    pub(super) tools: ToolsConfig,
}

impl FileConfig {
    pub(super) fn into_config(self) -> Config {
        Config {
            api: self.api,
            model: self.model,
            storage: self.storage,
            memory: self.memory,
            network: self.network,
            tools: self.tools,
        }
    }
}

/// Diagnostics captured while resolving runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigDiagnostics {
    /// Legacy compatibility paths currently in use.
    pub deprecations: Vec<String>,
}

/// Configuration payload plus load-time diagnostics.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub diagnostics: ConfigDiagnostics,
}
