//! Per-user conversation service.
//!
//! Ties one user turn together: session bookkeeping, persistence of every
//! message the turn produced, context building, the turn engine itself, and
//! the post-turn compaction check.

use crate::agent::{run_turn, TurnObserver, TurnOptions};
use crate::api::ModelClient;
use crate::config::{MemoryConfig, ModelConfig};
use crate::error::{ConversationError, StoreError};
use crate::memory::{build_context, Compactor};
use crate::store::SqliteStore;
use crate::textutil::session_preview;
use crate::tools::ToolRegistry;
use crate::types::{Message, ToolResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Stored in place of an empty assistant reply.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "(no response)";

/// The logged-in user a service acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: i64,
    pub login: String,
}

/// Static settings shared by every turn.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub model: ModelConfig,
    pub memory: MemoryConfig,
    pub system_prompt: String,
}

/// What one processed user message produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedTurn {
    pub session_id: i64,
    /// Trimmed assistant text; may be empty.
    pub assistant_text: String,
    pub tool_results: Vec<ToolResult>,
    /// True when the session history was compacted after this turn.
    pub summarized: bool,
}

pub struct ConversationService {
    store: Arc<SqliteStore>,
    client: Arc<dyn ModelClient>,
    tools: ToolRegistry,
    compactor: Compactor,
    settings: ServiceSettings,
    user: UserIdentity,
}

impl ConversationService {
    pub fn new(
        store: Arc<SqliteStore>,
        client: Arc<dyn ModelClient>,
        tools: ToolRegistry,
        settings: ServiceSettings,
        user: UserIdentity,
    ) -> Self {
        let compactor = Compactor::from_config(&settings.memory, &settings.model);
        Self {
            store,
            client,
            tools,
            compactor,
            settings,
            user,
        }
    }

    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Create a session whose preview is taken from `first_message`.
    pub fn start_session(&self, first_message: &str) -> Result<i64, StoreError> {
        self.store
            .create_session(self.user.id, &session_preview(first_message))
    }

    /// Run one user message through the assistant and persist everything it
    /// produced. A new session is created when `session_id` is `None`.
    pub async fn process_user_message(
        &self,
        input: &str,
        session_id: Option<i64>,
        observer: &mut (dyn TurnObserver + Send),
    ) -> Result<ProcessedTurn, ConversationError> {
        let user_id = self.user.id;
        let session_id = match session_id {
            Some(id) => id,
            None => self.start_session(input)?,
        };

        self.store
            .append_message(user_id, session_id, &Message::user(input))?;

        let stored = self.store.messages(user_id, session_id)?;
        let context = build_context(&self.settings.system_prompt, &stored);
        let options = self.turn_options(session_id);
        let turn = run_turn(
            self.client.as_ref(),
            &self.tools,
            &options,
            &context,
            observer,
        )
        .await?;

        for result in &turn.tool_results {
            self.store.append_message(
                user_id,
                session_id,
                &Message::tool(&result.name, &result.call_id, &result.output),
            )?;
        }

        let assistant_text = turn.assistant_text.trim().to_string();
        let stored_reply = if assistant_text.is_empty() {
            EMPTY_REPLY_PLACEHOLDER
        } else {
            assistant_text.as_str()
        };
        self.store
            .append_message(user_id, session_id, &Message::assistant(stored_reply))?;

        let summarized = match self
            .compactor
            .compact_if_needed(&self.store, self.client.as_ref(), user_id, session_id)
            .await
        {
            Ok(outcome) => outcome.was_compacted(),
            Err(err) => {
                warn!(session_id, error = %err, "compaction check failed");
                false
            }
        };
        debug!(
            session_id,
            tools = turn.tool_results.len(),
            summarized,
            "turn persisted"
        );

        Ok(ProcessedTurn {
            session_id,
            assistant_text,
            tool_results: turn.tool_results,
            summarized,
        })
    }

    fn turn_options(&self, session_id: i64) -> TurnOptions {
        let mut metadata = BTreeMap::new();
        metadata.insert("user_id".to_string(), self.user.id.to_string());
        metadata.insert("user_login".to_string(), self.user.login.clone());
        metadata.insert("session_id".to_string(), session_id.to_string());
        TurnOptions {
            model: self.settings.model.name.clone(),
            temperature: Some(self.settings.model.temperature),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::NoopObserver;
    use crate::testsupport::{
        call_added, completed_calls, completed_text, delta, echo_registry, ScriptedModelClient,
    };
    use crate::types::{InputItem, Role};

    const MODEL: &str = "test-model-without-tokenizer";

    fn service_with(
        client: Arc<ScriptedModelClient>,
        trigger_tokens: usize,
    ) -> (ConversationService, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let user_id = store.ensure_user("ana").unwrap();
        let settings = ServiceSettings {
            model: ModelConfig {
                name: MODEL.into(),
                temperature: 0.5,
            },
            memory: MemoryConfig {
                summary_token_target: 100,
                summary_trigger_tokens: trigger_tokens,
            },
            system_prompt: "You are a test assistant.".into(),
        };
        let service = ConversationService::new(
            store.clone(),
            client,
            echo_registry(),
            settings,
            UserIdentity {
                id: user_id,
                login: "ana".into(),
            },
        );
        (service, store)
    }

    #[tokio::test]
    async fn first_message_creates_session_and_persists_turn() {
        let client = Arc::new(ScriptedModelClient::new());
        client.push_round(vec![
            call_added("call_1", "get_country_info"),
            completed_calls(
                "resp_1",
                &[("call_1", "get_country_info", r#"{"country_name":"Peru"}"#)],
            ),
        ]);
        client.push_round(vec![delta("  Lima.  "), completed_text("resp_2", "Lima.")]);
        let (service, store) = service_with(client.clone(), 1_000_000);

        let turn = service
            .process_user_message("Capital of Peru?", None, &mut NoopObserver)
            .await
            .unwrap();
        assert_eq!(turn.assistant_text, "Lima.");
        assert_eq!(turn.tool_results.len(), 1);
        assert!(!turn.summarized);

        let sessions = store.list_sessions(service.user().id).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, turn.session_id);
        assert_eq!(sessions[0].first_message, "Capital of Peru?");

        let log = store.messages(service.user().id, turn.session_id).unwrap();
        let roles: Vec<Role> = log.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Tool, Role::Assistant]);
        assert_eq!(log[1].tool_name.as_deref(), Some("get_country_info"));
        assert_eq!(log[1].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(log[2].content, "Lima.");

        let first = &client.stream_requests()[0];
        assert_eq!(
            first.input[0],
            InputItem::Message {
                role: Role::System,
                content: "You are a test assistant.".into(),
            }
        );
        assert_eq!(first.metadata["user_login"], "ana");
        assert_eq!(first.metadata["session_id"], turn.session_id.to_string());
    }

    #[tokio::test]
    async fn long_first_message_is_previewed() {
        let client = Arc::new(ScriptedModelClient::new());
        client.push_round(vec![completed_text("resp_1", "")]);
        let (service, store) = service_with(client, 1_000_000);

        let long = "x".repeat(80);
        service
            .process_user_message(&long, None, &mut NoopObserver)
            .await
            .unwrap();
        let preview = &store.list_sessions(service.user().id).unwrap()[0].first_message;
        assert_eq!(preview, &format!("{}...", "x".repeat(50)));
    }

    #[tokio::test]
    async fn empty_reply_stores_placeholder() {
        let client = Arc::new(ScriptedModelClient::new());
        client.push_round(vec![delta("   "), completed_text("resp_1", "")]);
        let (service, store) = service_with(client, 1_000_000);

        let turn = service
            .process_user_message("hello", None, &mut NoopObserver)
            .await
            .unwrap();
        assert_eq!(turn.assistant_text, "");
        let log = store.messages(service.user().id, turn.session_id).unwrap();
        assert_eq!(log.last().unwrap().content, EMPTY_REPLY_PLACEHOLDER);
    }

    #[tokio::test]
    async fn second_turn_sees_previous_history_with_tool_prefix() {
        let client = Arc::new(ScriptedModelClient::new());
        client.push_round(vec![completed_calls(
            "resp_1",
            &[("call_1", "get_country_info", r#"{"country_name":"Peru"}"#)],
        )]);
        client.push_round(vec![delta("Lima."), completed_text("resp_2", "Lima.")]);
        client.push_round(vec![delta("Sol."), completed_text("resp_3", "Sol.")]);
        let (service, _store) = service_with(client.clone(), 1_000_000);

        let first = service
            .process_user_message("Capital of Peru?", None, &mut NoopObserver)
            .await
            .unwrap();
        service
            .process_user_message("And its currency?", Some(first.session_id), &mut NoopObserver)
            .await
            .unwrap();

        let third = &client.stream_requests()[2];
        let contents: Vec<&str> = third
            .input
            .iter()
            .filter_map(|item| match item {
                InputItem::Message { content, .. } => Some(content.as_str()),
                InputItem::FunctionCallOutput { .. } => None,
            })
            .collect();
        assert_eq!(contents.len(), 5);
        assert_eq!(contents[1], "Capital of Peru?");
        assert!(contents[2].starts_with("[tool:get_country_info] get_country_info"));
        assert_eq!(contents[3], "Lima.");
        assert_eq!(contents[4], "And its currency?");
    }

    #[tokio::test]
    async fn stream_fault_keeps_user_message_and_fails() {
        let client = Arc::new(ScriptedModelClient::new());
        client.push_open_failure("down");
        let (service, store) = service_with(client, 1_000_000);
        let session = service.start_session("hi").unwrap();

        let err = service
            .process_user_message("hi", Some(session), &mut NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(err, ConversationError::Agent(_)));
        let log = store.messages(service.user().id, session).unwrap();
        assert_eq!(log, vec![Message::user("hi")]);
    }

    #[tokio::test]
    async fn foreign_session_is_rejected_before_any_model_call() {
        let client = Arc::new(ScriptedModelClient::new());
        let (service, store) = service_with(client.clone(), 1_000_000);
        let other = store.ensure_user("bruno").unwrap();
        let foreign = store.create_session(other, "private").unwrap();

        let err = service
            .process_user_message("peek", Some(foreign), &mut NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConversationError::Store(StoreError::SessionNotFound)
        ));
        assert!(client.stream_requests().is_empty());
    }

    #[tokio::test]
    async fn over_budget_turn_is_summarized() {
        let client = Arc::new(ScriptedModelClient::new());
        client.push_round(vec![delta("Lima."), completed_text("resp_1", "Lima.")]);
        client.push_text(Ok("- Main topics: Peru"));
        let (service, store) = service_with(client.clone(), 1);

        let turn = service
            .process_user_message("Capital of Peru?", None, &mut NoopObserver)
            .await
            .unwrap();
        assert!(turn.summarized);
        assert_eq!(turn.assistant_text, "Lima.");
        let log = store.messages(service.user().id, turn.session_id).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].role, Role::Assistant);
        assert!(log[0]
            .content
            .starts_with("[Resume of previous conversation - 2 messages summarized]"));
        assert_eq!(client.text_requests()[0].metadata["purpose"], "summarize_session");
    }

    #[tokio::test]
    async fn failed_summary_is_invisible_to_the_turn() {
        let client = Arc::new(ScriptedModelClient::new());
        client.push_round(vec![delta("Lima."), completed_text("resp_1", "Lima.")]);
        client.push_text(Err("rate limited"));
        let (service, store) = service_with(client, 1);

        let turn = service
            .process_user_message("Capital of Peru?", None, &mut NoopObserver)
            .await
            .unwrap();
        assert!(!turn.summarized);
        assert_eq!(
            store
                .messages(service.user().id, turn.session_id)
                .unwrap()
                .len(),
            2
        );
    }
}
