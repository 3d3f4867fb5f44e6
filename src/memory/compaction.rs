//! Token-budgeted history compaction.
//!
//! Once a session's stored history reaches the trigger budget, the whole log
//! is summarized by one non-streaming model call and replaced, inside a single
//! store transaction, by one assistant message carrying that summary. A failed
//! or empty summary leaves the history untouched.

use crate::api::ModelClient;
use crate::config::{MemoryConfig, ModelConfig};
use crate::error::StoreError;
use crate::prompt::render_summary_prompt;
use crate::store::SqliteStore;
use crate::tokens::TokenCounter;
use crate::types::{Message, TextRequest};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Low fixed temperature so summaries stay stable.
pub const SUMMARY_TEMPERATURE: f64 = 0.3;

/// Result of one compaction check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// History is below the trigger budget.
    NotNeeded { tokens: usize },
    /// Budget exceeded but summarization produced nothing usable.
    Skipped { reason: String },
    /// History was replaced by a single summary message.
    Compacted {
        summarized_messages: usize,
        tokens_before: usize,
    },
}

impl CompactionOutcome {
    pub fn was_compacted(&self) -> bool {
        matches!(self, Self::Compacted { .. })
    }
}

/// Decides when to compact and performs the replacement.
#[derive(Debug, Clone)]
pub struct Compactor {
    trigger_tokens: usize,
    target_tokens: u32,
    model: String,
    counter: TokenCounter,
}

impl Compactor {
    pub fn new(trigger_tokens: usize, target_tokens: u32, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            trigger_tokens,
            target_tokens,
            counter: TokenCounter::new(&model),
            model,
        }
    }

    pub fn from_config(memory: &MemoryConfig, model: &ModelConfig) -> Self {
        Self::new(
            memory.summary_trigger_tokens,
            memory.summary_token_target,
            &model.name,
        )
    }

    /// Summarize and replace the session's history when it reaches the
    /// trigger budget.
    ///
    /// Only reading the history can fail; problems after that point are
    /// reported as [`CompactionOutcome::Skipped`].
    pub async fn compact_if_needed(
        &self,
        store: &SqliteStore,
        client: &dyn ModelClient,
        user_id: i64,
        session_id: i64,
    ) -> Result<CompactionOutcome, StoreError> {
        let messages = store.messages(user_id, session_id)?;
        let tokens = self.counter.count_messages(&messages);
        if tokens < self.trigger_tokens {
            debug!(session_id, tokens, trigger = self.trigger_tokens, "compaction not needed");
            return Ok(CompactionOutcome::NotNeeded { tokens });
        }

        info!(
            session_id,
            tokens,
            messages = messages.len(),
            "history over budget, summarizing"
        );
        let request = self.summary_request(&messages, user_id, session_id);
        let summary = match client.create_response(&request).await {
            Ok(text) => text.trim().to_string(),
            Err(err) => return Ok(skipped(session_id, format!("summary request failed: {err}"))),
        };
        if summary.is_empty() {
            return Ok(skipped(session_id, "model returned an empty summary".into()));
        }

        let replacement = summary_message(messages.len(), &summary);
        if let Err(err) = store.replace_with_summary(user_id, session_id, &replacement) {
            return Ok(skipped(session_id, format!("could not store summary: {err}")));
        }
        Ok(CompactionOutcome::Compacted {
            summarized_messages: messages.len(),
            tokens_before: tokens,
        })
    }

    fn summary_request(&self, messages: &[Message], user_id: i64, session_id: i64) -> TextRequest {
        let mut metadata = BTreeMap::new();
        metadata.insert("purpose".to_string(), "summarize_session".to_string());
        metadata.insert("user_id".to_string(), user_id.to_string());
        metadata.insert("session_id".to_string(), session_id.to_string());
        TextRequest {
            model: self.model.clone(),
            input: render_summary_prompt(self.target_tokens, &transcript(messages)),
            temperature: Some(SUMMARY_TEMPERATURE),
            max_output_tokens: Some(self.target_tokens),
            metadata,
        }
    }
}

fn skipped(session_id: i64, reason: String) -> CompactionOutcome {
    warn!(session_id, %reason, "compaction skipped");
    CompactionOutcome::Skipped { reason }
}

/// `Role: content` lines, one per message.
fn transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|msg| format!("{}: {}", msg.role.label(), msg.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn summary_message(count: usize, summary: &str) -> String {
    format!("[Resume of previous conversation - {count} messages summarized]\n\n{summary}")
        .trim()
        .to_string()
}
