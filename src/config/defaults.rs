//! Default configuration constants.
//!
//! Keeping defaults in one module lets the types, the env layer, and tests
//! share the same literals.

/// Default provider model ID.
pub(super) const DEFAULT_MODEL_ID: &str = "gpt-4.1-mini";
/// Default sampling temperature for chat turns.
pub(super) const DEFAULT_TEMPERATURE: f64 = 0.5;
/// Inclusive temperature bounds accepted by the provider.
pub(super) const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=2.0;
/// Default OpenAI-compatible API base URL.
pub(super) const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
/// Default SQLite database location, relative to the working directory.
pub(super) const DEFAULT_DB_PATH: &str = "./data/mundi_sessions.db";
/// Approximate token budget for a session summary.
pub(super) const DEFAULT_SUMMARY_TOKEN_TARGET: u32 = 700;
/// Stored-history token count at which a session is compacted.
pub(super) const DEFAULT_SUMMARY_TRIGGER_TOKENS: usize = 70_000;
/// Default timeout for model API requests, streams included.
pub(super) const DEFAULT_API_TIMEOUT_SECS: u64 = 120;
/// Default timeout for tool lookups.
pub(super) const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
/// Pause before the single retry of a failed tool lookup.
pub(super) const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
/// REST Countries API root.
pub(super) const DEFAULT_COUNTRY_API_BASE_URL: &str = "https://restcountries.com/v3.1";
/// Exchange-rate API root.
pub(super) const DEFAULT_EXCHANGE_API_BASE_URL: &str = "https://api.exchangerate-api.com/v4";
