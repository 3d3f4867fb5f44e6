//! Environment override and legacy env-alias handling.
//!
//! Environment variables take precedence over the config file. The legacy
//! `TS_DB_PATH` alias is accepted for the database path and surfaced via
//! diagnostics.

use crate::error::ConfigError;

use super::defaults::TEMPERATURE_RANGE;
use super::{Config, ConfigDiagnostics};

pub(super) fn apply_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(key) = non_empty(env_lookup, "OPENAI_API_KEY") {
        config.api.api_key = key;
    }
    if let Some(project) = non_empty(env_lookup, "OPENAI_PROJECT_ID") {
        config.api.project_id = Some(project);
    }
    if let Some(url) = non_empty(env_lookup, "OPENAI_BASE_URL") {
        config.api.base_url = url;
    }
    if let Some(model) = non_empty(env_lookup, "MODEL_NAME") {
        config.model.name = model;
    }
    if let Some(raw) = non_empty(env_lookup, "TEMPERATURE") {
        config.model.temperature = raw.trim().parse::<f64>().map_err(|_| {
            ConfigError::Invalid(format!("invalid TEMPERATURE value `{raw}`: expected a number"))
        })?;
    }
    if let Some(path) = env_with_legacy(env_lookup, "MUNDI_DB_PATH", "TS_DB_PATH") {
        config.storage.db_path = path.into();
    }
    if let Some(raw) = non_empty(env_lookup, "SUMMARY_TOKEN_TARGET") {
        config.memory.summary_token_target = parse_positive(&raw, "SUMMARY_TOKEN_TARGET")?;
    }
    if let Some(raw) = non_empty(env_lookup, "SUMMARY_TRIGGER_TOKENS") {
        config.memory.summary_trigger_tokens = parse_positive(&raw, "SUMMARY_TRIGGER_TOKENS")?;
    }
    if let Some(raw) = non_empty(env_lookup, "MUNDI_API_TIMEOUT_SECS") {
        // Clamp to at least 1 second to avoid "no-timeout" accidental behavior.
        config.network.api_timeout_secs =
            parse_positive::<u64>(&raw, "MUNDI_API_TIMEOUT_SECS")?.max(1);
    }
    if let Some(raw) = non_empty(env_lookup, "MUNDI_FETCH_TIMEOUT_SECS") {
        config.network.fetch_timeout_secs =
            parse_positive::<u64>(&raw, "MUNDI_FETCH_TIMEOUT_SECS")?.max(1);
    }
    Ok(())
}

/// Reject values the provider would refuse, before any request is made.
pub(super) fn validate(config: &Config) -> Result<(), ConfigError> {
    let temperature = config.model.temperature;
    if !TEMPERATURE_RANGE.contains(&temperature) {
        return Err(ConfigError::Invalid(format!(
            "TEMPERATURE must be between 0.0 and 2.0, got {temperature}"
        )));
    }
    if config.model.name.trim().is_empty() {
        return Err(ConfigError::Invalid("model name must not be empty".into()));
    }
    if config.api.api_key.trim().is_empty() {
        return Err(ConfigError::MissingApiKey);
    }
    Ok(())
}

fn parse_positive<T>(raw: &str, name: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    raw.trim()
        .parse::<T>()
        .ok()
        .filter(|value| *value > T::default())
        .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "invalid {name} value `{raw}`: expected a positive integer"
            ))
        })
}

fn non_empty<FEnv>(env_lookup: &FEnv, name: &str) -> Option<String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    env_lookup(name).filter(|value| !value.trim().is_empty())
}

/// Resolve a value from canonical env var or, if absent, its legacy alias.
pub(super) fn env_with_legacy<FEnv>(
    env_lookup: &FEnv,
    canonical: &str,
    legacy: &str,
) -> Option<String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    non_empty(env_lookup, canonical).or_else(|| non_empty(env_lookup, legacy))
}

/// Record diagnostics for legacy env alias usage when canonical vars are absent.
pub(super) fn collect_legacy_env_warnings<FEnv>(
    diagnostics: &mut ConfigDiagnostics,
    env_lookup: &FEnv,
) where
    FEnv: Fn(&str) -> Option<String>,
{
    if non_empty(env_lookup, "MUNDI_DB_PATH").is_none()
        && non_empty(env_lookup, "TS_DB_PATH").is_some()
    {
        diagnostics
            .deprecations
            .push("Detected deprecated env var `TS_DB_PATH`. Use MUNDI_DB_PATH instead.".into());
    }
}
