//! Line-oriented chat loop.
//!
//! The submodules are focused:
//! - `commands` classifies input lines and words tool narration.
//! - `prompts` handles the login prompt and the session picker.

pub mod commands;
pub mod prompts;

pub use commands::{tool_narration, ReplCommand, CLEAR_COMMANDS, EXIT_COMMANDS};
pub use prompts::{prompt_login, prompt_session_menu};

use crate::agent::FnObserver;
use crate::conversation::{ConversationService, EMPTY_REPLY_PLACEHOLDER};
use crate::render::Renderer;
use tokio::io::{AsyncBufRead, Lines};
use tracing::warn;

/// Shown instead of any turn-level failure detail.
pub const TURN_FAILED_MESSAGE: &str =
    "Sorry, something went wrong while answering. Please try again.";

/// Why the chat loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The user typed an exit word.
    Quit,
    /// Ctrl-C while waiting for input.
    Interrupted,
    EndOfInput,
}

/// Run turns until the user leaves. `session_id` is the session to continue,
/// `None` to start a new one with the first message.
pub async fn run_chat_loop<R>(
    service: &ConversationService,
    renderer: &Renderer,
    lines: &mut Lines<R>,
    mut session_id: Option<i64>,
) -> std::io::Result<LoopExit>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        renderer.prompt("You:");
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                renderer.info("Interrupted. Goodbye!");
                return Ok(LoopExit::Interrupted);
            }
        };
        let Some(line) = line else {
            eprintln!();
            return Ok(LoopExit::EndOfInput);
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Exit => {
                renderer.info("Goodbye!");
                return Ok(LoopExit::Quit);
            }
            ReplCommand::Clear => {
                if let Some(id) = session_id.take() {
                    if let Err(err) = service.store().delete_session(service.user().id, id) {
                        renderer.warn(&format!("could not clear the session: {err}"));
                    }
                }
                renderer.info("Conversation history cleared.");
            }
            ReplCommand::Message(text) => {
                let id = match session_id {
                    Some(id) => id,
                    None => match service.start_session(text) {
                        Ok(id) => id,
                        Err(err) => {
                            warn!(error = %err, "could not create session");
                            renderer.error(TURN_FAILED_MESSAGE);
                            continue;
                        }
                    },
                };
                session_id = Some(id);
                run_one_turn(service, renderer, text, id).await;
            }
        }
    }
}

async fn run_one_turn(
    service: &ConversationService,
    renderer: &Renderer,
    text: &str,
    session_id: i64,
) {
    renderer.assistant_label();
    let mut observer = FnObserver::new(
        |delta: &str| renderer.text_delta(delta),
        |name: &str| renderer.tool_activity(&tool_narration(name)),
    );
    match service
        .process_user_message(text, Some(session_id), &mut observer)
        .await
    {
        Ok(turn) => {
            if turn.assistant_text.is_empty() {
                renderer.text_delta(EMPTY_REPLY_PLACEHOLDER);
            }
            renderer.end_reply();
            if turn.summarized {
                renderer.info("Older messages were summarized to keep the conversation short.");
            }
        }
        Err(err) => {
            renderer.end_reply();
            warn!(session_id, error = %err, "turn failed");
            renderer.error(TURN_FAILED_MESSAGE);
        }
    }
}
