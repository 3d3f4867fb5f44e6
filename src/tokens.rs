//! Token counting for compaction decisions.
//!
//! Uses the model's BPE tokenizer when `tiktoken-rs` knows the model, and a
//! rough estimation heuristic (~1 token per 4 chars) otherwise.

use crate::types::Message;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// Characters per token assumed by the fallback heuristic.
const CHARS_PER_TOKEN: usize = 4;

/// Process-wide tokenizer cache keyed by model name. `None` records a model
/// the tokenizer library does not know, so the lookup is not repeated.
fn encoder_cache() -> &'static Mutex<HashMap<String, Option<Arc<CoreBPE>>>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Option<Arc<CoreBPE>>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn resolve_encoder(model: &str) -> Option<Arc<CoreBPE>> {
    // A poisoned cache only costs precision; fall back to the heuristic.
    let mut cache = encoder_cache().lock().ok()?;
    if let Some(cached) = cache.get(model) {
        return cached.clone();
    }
    let resolved = match tiktoken_rs::get_bpe_from_model(model).or_else(|err| {
        match o200k_alias(model) {
            Some(alias) => tiktoken_rs::get_bpe_from_model(alias),
            None => Err(err),
        }
    }) {
        Ok(bpe) => Some(Arc::new(bpe)),
        Err(err) => {
            debug!(model, error = %err, "no tokenizer for model, using estimate");
            None
        }
    };
    cache.insert(model.to_string(), resolved.clone());
    resolved
}

/// Model families that use the o200k encoding but are newer than the
/// tokenizer crate's model table.
const O200K_PREFIXES: &[&str] = &["gpt-4.1", "gpt-4.5", "gpt-5", "o1", "o3", "o4"];

/// A model name the tokenizer crate knows with the same encoding as `model`.
fn o200k_alias(model: &str) -> Option<&'static str> {
    O200K_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
        .then_some("gpt-4o")
}

/// Model-aware token counter.
#[derive(Clone)]
pub struct TokenCounter {
    encoder: Option<Arc<CoreBPE>>,
}

impl TokenCounter {
    /// Build a counter for `model`, reusing a cached tokenizer when present.
    pub fn new(model: &str) -> Self {
        Self {
            encoder: resolve_encoder(model),
        }
    }

    /// True when counts come from a real tokenizer rather than the estimate.
    pub fn is_exact(&self) -> bool {
        self.encoder.is_some()
    }

    /// Tokens in `text`. Empty text is zero tokens.
    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match &self.encoder {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => estimate(text),
        }
    }

    /// Sum of content tokens across stored messages.
    pub fn count_messages(&self, messages: &[Message]) -> usize {
        messages.iter().map(|msg| self.count(&msg.content)).sum()
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("exact", &self.is_exact())
            .finish()
    }
}

/// Heuristic count: `max(1, ceil(chars / 4))` for non-empty text.
pub fn estimate(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.chars().count().div_ceil(CHARS_PER_TOKEN).max(1)
}
