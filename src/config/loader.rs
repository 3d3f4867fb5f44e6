//! Top-level config loading pipeline.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::env::{apply_env_overrides, collect_legacy_env_warnings, validate};
use super::sources::{config_root_dir, read_config_text_with_sources, ConfigSource};
use super::{Config, ConfigDiagnostics, FileConfig, LoadedConfig};
use tracing::debug;

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from `--config`).
pub fn load_config(path_override: Option<&Path>) -> Result<Config, ConfigError> {
    Ok(load_config_with_diagnostics(path_override)?.config)
}

/// Load configuration and return compatibility diagnostics.
pub fn load_config_with_diagnostics(
    path_override: Option<&Path>,
) -> Result<LoadedConfig, ConfigError> {
    load_config_with_diagnostics_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

pub(super) fn load_config_with_diagnostics_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&Path>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<LoadedConfig, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let (config_text, source) =
        read_config_text_with_sources(path_override, &read_file, &config_root)?;
    if source != ConfigSource::BuiltInDefaults {
        debug!(?source, "loaded config file");
    }
    let parsed: FileConfig = toml::from_str(&config_text)?;
    let mut config = parsed.into_config();

    apply_env_overrides(&mut config, &env_lookup)?;
    validate(&config)?;

    let mut diagnostics = ConfigDiagnostics::default();
    collect_legacy_env_warnings(&mut diagnostics, &env_lookup);

    Ok(LoadedConfig {
        config,
        diagnostics,
    })
}
