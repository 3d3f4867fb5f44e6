//! Persistent per-user, per-session conversation store on SQLite.
//!
//! Every operation that names a session is scoped by the owning user: a
//! session id belonging to someone else behaves exactly like a missing one
//! and fails with [`StoreError::SessionNotFound`].

use crate::error::StoreError;
use crate::types::{Message, Role};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

/// One row of the session picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: i64,
    /// Preview of the session's first user message.
    pub first_message: String,
    /// Last activity, formatted `dd-mm-yyyy`.
    pub updated_at: String,
}

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        login TEXT UNIQUE NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        first_message TEXT NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id INTEGER NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        tool_name TEXT,
        tool_call_id TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_sessions_user_updated
    ON sessions(user_id, updated_at DESC);

    CREATE INDEX IF NOT EXISTS idx_messages_session_id
    ON messages(session_id, id ASC);

    CREATE TRIGGER IF NOT EXISTS bump_session_updated_at
    AFTER INSERT ON messages
    BEGIN
        UPDATE sessions
        SET updated_at = CURRENT_TIMESTAMP
        WHERE id = NEW.session_id;
    END;
";

/// SQLite-backed store. The connection is serialized behind a mutex.
#[derive(Debug)]
pub struct SqliteStore {
    connection: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let connection = Connection::open(path)?;
        // WAL is a persistent property of file databases only.
        connection.pragma_update(None, "journal_mode", "WAL")?;
        info!(path = %path.display(), "opened conversation store");
        Self::with_connection(connection)
    }

    /// Private in-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(connection: Connection) -> Result<Self, StoreError> {
        connection.busy_timeout(Duration::from_secs(5))?;
        connection.execute_batch(SCHEMA)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection.lock().map_err(|_| StoreError::LockPoisoned)
    }

    // -----------------------------------------------------------------------
    // Users and sessions
    // -----------------------------------------------------------------------

    /// Id of the user with `login`, creating the user on first sight.
    pub fn ensure_user(&self, login: &str) -> Result<i64, StoreError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT OR IGNORE INTO users (login) VALUES (?1)",
            params![login],
        )?;
        let id = conn.query_row(
            "SELECT id FROM users WHERE login = ?1",
            params![login],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// The user's sessions, most recently active first.
    pub fn list_sessions(&self, user_id: i64) -> Result<Vec<SessionSummary>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, first_message, strftime('%d-%m-%Y', updated_at)
             FROM sessions
             WHERE user_id = ?1
             ORDER BY updated_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(SessionSummary {
                id: row.get(0)?,
                first_message: row.get(1)?,
                updated_at: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
        })?;
        let sessions = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// Start a session whose picker preview is `first_message`.
    pub fn create_session(&self, user_id: i64, first_message: &str) -> Result<i64, StoreError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO sessions (user_id, first_message) VALUES (?1, ?2)",
            params![user_id, first_message],
        )?;
        let id = conn.last_insert_rowid();
        debug!(user_id, session_id = id, "created session");
        Ok(id)
    }

    /// Delete a session and, by cascade, its messages. `false` when the user
    /// owns no such session.
    pub fn delete_session(&self, user_id: i64, session_id: i64) -> Result<bool, StoreError> {
        let conn = self.connection()?;
        let changed = conn.execute(
            "DELETE FROM sessions WHERE user_id = ?1 AND id = ?2",
            params![user_id, session_id],
        )?;
        debug!(user_id, session_id, deleted = changed > 0, "delete session");
        Ok(changed > 0)
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// Append one message to the session's log.
    pub fn append_message(
        &self,
        user_id: i64,
        session_id: i64,
        message: &Message,
    ) -> Result<(), StoreError> {
        let conn = self.connection()?;
        ensure_owned(&conn, user_id, session_id)?;
        conn.execute(
            "INSERT INTO messages (session_id, role, content, tool_name, tool_call_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session_id,
                message.role.as_str(),
                &message.content,
                message.tool_name.as_deref(),
                message.tool_call_id.as_deref(),
            ],
        )?;
        Ok(())
    }

    /// The session's messages in insertion order.
    pub fn messages(&self, user_id: i64, session_id: i64) -> Result<Vec<Message>, StoreError> {
        let conn = self.connection()?;
        ensure_owned(&conn, user_id, session_id)?;
        let mut stmt = conn.prepare(
            "SELECT role, content, tool_name, tool_call_id
             FROM messages
             WHERE session_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            let raw_role: String = row.get(0)?;
            let role = Role::parse(&raw_role).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    format!("unknown message role `{raw_role}`").into(),
                )
            })?;
            Ok(Message {
                role,
                content: row.get(1)?,
                tool_name: row.get(2)?,
                tool_call_id: row.get(3)?,
            })
        })?;
        let messages = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    /// Remove every message but keep the session itself.
    ///
    /// Library API only: the REPL's clear command deletes the whole session
    /// with [`SqliteStore::delete_session`] instead.
    pub fn clear_messages(&self, user_id: i64, session_id: i64) -> Result<(), StoreError> {
        let conn = self.connection()?;
        ensure_owned(&conn, user_id, session_id)?;
        conn.execute(
            "DELETE FROM messages WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(())
    }

    /// Atomically replace the whole log with a single assistant message.
    pub fn replace_with_summary(
        &self,
        user_id: i64,
        session_id: i64,
        summary: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        ensure_owned(&tx, user_id, session_id)?;
        let removed = tx.execute(
            "DELETE FROM messages WHERE session_id = ?1",
            params![session_id],
        )?;
        tx.execute(
            "INSERT INTO messages (session_id, role, content) VALUES (?1, ?2, ?3)",
            params![session_id, Role::Assistant.as_str(), summary],
        )?;
        tx.commit()?;
        info!(session_id, removed, "replaced session history with summary");
        Ok(())
    }
}

fn ensure_owned(conn: &Connection, user_id: i64, session_id: i64) -> Result<(), StoreError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sessions WHERE user_id = ?1 AND id = ?2",
            params![user_id, session_id],
            |_| Ok(()),
        )
        .optional()?;
    found.ok_or(StoreError::SessionNotFound)
}
