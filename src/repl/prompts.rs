//! Startup prompts: login and session picker.

use crate::error::ReplError;
use crate::render::Renderer;
use crate::store::SqliteStore;
use tokio::io::{AsyncBufRead, Lines};

/// Ask for a non-empty login. `None` when input ends first.
pub async fn prompt_login<R>(
    renderer: &Renderer,
    lines: &mut Lines<R>,
) -> Result<Option<String>, ReplError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        renderer.prompt("Login:");
        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        let login = line.trim();
        if !login.is_empty() {
            return Ok(Some(login.to_string()));
        }
        renderer.warn("Please enter your login to continue.");
    }
}

/// Let the user resume one of their sessions or start a new one.
///
/// Returns the chosen session id, `None` for a new conversation. End of
/// input also means a new conversation; the chat loop then ends on its own.
pub async fn prompt_session_menu<R>(
    renderer: &Renderer,
    store: &SqliteStore,
    user_id: i64,
    lines: &mut Lines<R>,
) -> Result<Option<i64>, ReplError>
where
    R: AsyncBufRead + Unpin,
{
    let sessions = store.list_sessions(user_id)?;
    if sessions.is_empty() {
        return Ok(None);
    }

    renderer.info("Select a conversation or start a new one:");
    renderer.menu_item("0", "New conversation", None);
    for (index, session) in sessions.iter().enumerate() {
        renderer.menu_item(
            &(index + 1).to_string(),
            &format!("ID {} - {}", session.id, session.first_message),
            Some(&session.updated_at),
        );
    }

    loop {
        renderer.prompt("Choice:");
        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        match line.trim().parse::<usize>() {
            Ok(0) => return Ok(None),
            Ok(n) if n <= sessions.len() => return Ok(Some(sessions[n - 1].id)),
            _ => renderer.warn(&format!(
                "Enter a number between 0 and {}.",
                sessions.len()
            )),
        }
    }
}
