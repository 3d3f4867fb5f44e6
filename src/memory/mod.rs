//! Conversation memory: what the model sees each turn and how the stored
//! history shrinks once it grows past the token budget.

pub mod compaction;
pub mod context;

pub use compaction::{CompactionOutcome, Compactor};
pub use context::build_context;
