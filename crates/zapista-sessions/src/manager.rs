use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, instrument};

use crate::error::{Result, SessionError};
use crate::types::{Session, SessionKey, SessionMessage};

/// Number of most-recent messages returned by `history()`. Chosen to match
/// the agent loop's "last 40 turns" window.
pub const HISTORY_WINDOW: usize = 40;

/// Thread-safe manager for per-chat conversation sessions.
///
/// Sessions are never shared across chats: every read/write is scoped by
/// `SessionKey`, so one chat's prompt can never pick up another chat's
/// history.
pub struct SessionManager {
    db: Mutex<Connection>,
}

impl SessionManager {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    #[instrument(skip(self), fields(key = %key))]
    pub fn get_or_create(&self, key: &SessionKey) -> Result<Session> {
        if let Some(session) = self.get(key)? {
            debug!("session cache hit");
            return Ok(session);
        }

        let now = chrono::Utc::now().to_rfc3339();
        let key_str = key.format();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT OR IGNORE INTO sessions (session_key, message_count, created_at, updated_at)
             VALUES (?1, 0, ?2, ?2)",
            rusqlite::params![key_str, now],
        )?;
        drop(db);

        self.get(key)?
            .ok_or_else(|| SessionError::NotFound { key: key_str })
    }

    #[instrument(skip(self), fields(key = %key))]
    pub fn get(&self, key: &SessionKey) -> Result<Option<Session>> {
        let key_str = key.format();
        let db = self.db.lock().unwrap();
        match db.query_row(
            "SELECT session_key, message_count, created_at, updated_at
             FROM sessions WHERE session_key = ?1",
            rusqlite::params![key_str],
            row_to_session,
        ) {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SessionError::Database(e)),
        }
    }

    /// Append one message and bump the session's stats. Ordered writes:
    /// messages are inserted with a monotonically increasing `id`, so
    /// `history()` returning the last N by `id` preserves arrival order.
    #[instrument(skip(self, content), fields(key = %key, role))]
    pub fn append_message(&self, key: &SessionKey, role: &str, content: &str) -> Result<()> {
        self.get_or_create(key)?;
        let key_str = key.format();
        let now = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO session_messages (session_key, role, content, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![key_str, role, content, now],
        )?;
        db.execute(
            "UPDATE sessions SET message_count = message_count + 1, updated_at = ?2
             WHERE session_key = ?1",
            rusqlite::params![key_str, now],
        )?;
        Ok(())
    }

    /// Return the most recent `HISTORY_WINDOW` messages, oldest first —
    /// exactly this session's history, never another chat's.
    #[instrument(skip(self), fields(key = %key))]
    pub fn history(&self, key: &SessionKey) -> Result<Vec<SessionMessage>> {
        let key_str = key.format();
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT role, content, timestamp FROM (
                SELECT role, content, timestamp, id FROM session_messages
                WHERE session_key = ?1 ORDER BY id DESC LIMIT ?2
             ) ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(
            rusqlite::params![key_str, HISTORY_WINDOW as i64],
            |row| {
                Ok(SessionMessage {
                    role: row.get(0)?,
                    content: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            },
        )?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    #[instrument(skip(self), fields(key = %key))]
    pub fn delete(&self, key: &SessionKey) -> Result<()> {
        let key_str = key.format();
        let db = self.db.lock().unwrap();
        db.execute(
            "DELETE FROM session_messages WHERE session_key = ?1",
            rusqlite::params![key_str],
        )?;
        let rows_changed = db.execute(
            "DELETE FROM sessions WHERE session_key = ?1",
            rusqlite::params![key_str],
        )?;
        if rows_changed == 0 {
            return Err(SessionError::NotFound { key: key_str });
        }
        Ok(())
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let key_str: String = row.get(0)?;
    let key = SessionKey::parse(&key_str).unwrap_or(SessionKey {
        channel: "unknown".to_string(),
        chat_id: key_str.clone(),
    });
    Ok(Session {
        key,
        message_count: row.get::<_, i64>(1)? as u32,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_db() -> SessionManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_db(&conn).unwrap();
        SessionManager::new(conn)
    }

    #[test]
    fn history_is_scoped_per_session() {
        let mgr = open_test_db();
        let k1 = SessionKey::new("whatsapp", "U1");
        let k2 = SessionKey::new("whatsapp", "U2");

        mgr.append_message(&k1, "user", "hello from U1").unwrap();
        mgr.append_message(&k2, "user", "hello from U2").unwrap();

        let h1 = mgr.history(&k1).unwrap();
        assert_eq!(h1.len(), 1);
        assert_eq!(h1[0].content, "hello from U1");

        let h2 = mgr.history(&k2).unwrap();
        assert_eq!(h2.len(), 1);
        assert_eq!(h2[0].content, "hello from U2");
    }

    #[test]
    fn history_window_is_capped_and_ordered() {
        let mgr = open_test_db();
        let k = SessionKey::new("whatsapp", "U1");
        for i in 0..(HISTORY_WINDOW + 5) {
            mgr.append_message(&k, "user", &format!("msg-{i}")).unwrap();
        }
        let h = mgr.history(&k).unwrap();
        assert_eq!(h.len(), HISTORY_WINDOW);
        assert_eq!(h[0].content, "msg-5");
        assert_eq!(h[h.len() - 1].content, format!("msg-{}", HISTORY_WINDOW + 4));
    }
}
