//! Mundi: a terminal assistant for country facts and exchange rates.
//!
//! The assistant streams answers from the OpenAI Responses API and lets the
//! model call two lookup tools (country information and exchange rates).
//! Conversations are stored per user and per session in SQLite, and a
//! session's history is summarized once it grows past a token budget.
//!
//! # Quick start
//!
//! ```no_run
//! use mundi::agent::NoopObserver;
//! use mundi::api::ApiClient;
//! use mundi::config::load_config;
//! use mundi::conversation::{ConversationService, ServiceSettings, UserIdentity};
//! use mundi::store::SqliteStore;
//! use mundi::tools::ToolRegistry;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let config = load_config(None).unwrap();
//! let store = Arc::new(SqliteStore::open(&config.storage.db_path).unwrap());
//! let user_id = store.ensure_user("ana").unwrap();
//! let client = Arc::new(ApiClient::new(&config.api, config.network.api_timeout()));
//! let service = ConversationService::new(
//!     store,
//!     client,
//!     ToolRegistry::new(),
//!     ServiceSettings {
//!         model: config.model.clone(),
//!         memory: config.memory.clone(),
//!         system_prompt: "You answer questions about countries.".into(),
//!     },
//!     UserIdentity { id: user_id, login: "ana".into() },
//! );
//! let turn = service
//!     .process_user_message("What is the capital of Peru?", None, &mut NoopObserver)
//!     .await
//!     .unwrap();
//! println!("{}", turn.assistant_text);
//! # }
//! ```

pub mod agent;
pub mod api;
pub mod build_info;
pub mod config;
pub mod conversation;
pub mod error;
pub mod memory;
pub mod prompt;
pub mod render;
pub mod repl;
pub mod store;
#[cfg(test)]
pub mod testsupport;
pub mod textutil;
pub mod tokens;
pub mod tools;
pub mod types;
