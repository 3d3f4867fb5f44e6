//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. CLI flags (`--model`, `--db`), applied by the binary
//! 2. Environment variables (`OPENAI_API_KEY`, `MODEL_NAME`, `TEMPERATURE`, ...)
//! 3. TOML file specified via `--config`
//! 4. `./mundi.toml` in the current directory
//! 5. `$XDG_CONFIG_HOME/mundi/mundi.toml` (or the platform equivalent)
//! 6. Built-in defaults

mod defaults;
mod env;
mod loader;
mod sources;
mod types;

pub use loader::{load_config, load_config_with_diagnostics};
pub use types::{
    ApiConfig, Config, ConfigDiagnostics, LoadedConfig, MemoryConfig, ModelConfig, NetworkConfig,
    StorageConfig, ToolsConfig,
};
use types::FileConfig;
