//! Per-user reminder history: the last N scheduled/delivered reminders, for
//! "rever lembretes"-style reviews and later analytics. Capped per kind per
//! user (LRU) — same persistence shape as the rest of this crate, a shared
//! `rusqlite::Connection` behind a mutex.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::Result;

/// Kept per kind per user; oldest rows beyond this are dropped on every
/// insert.
pub const MAX_PER_USER_PER_KIND: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    /// A reminder request was scheduled (for "rever pedido").
    Scheduled,
    /// A reminder actually fired and was delivered to the user.
    Delivered,
}

impl ReminderKind {
    fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::Scheduled => "scheduled",
            ReminderKind::Delivered => "delivered",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReminderHistoryEntry {
    pub kind: ReminderKind,
    pub message: String,
    pub created_at_ms: i64,
}

pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS reminder_history (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id       TEXT NOT NULL,
            kind          TEXT NOT NULL,
            message       TEXT NOT NULL,
            created_at_ms INTEGER NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_reminder_history_user_kind
            ON reminder_history(user_id, kind, created_at_ms DESC);",
    )
}

pub struct ReminderHistoryStore {
    db: Arc<Mutex<Connection>>,
}

impl ReminderHistoryStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    pub fn add_scheduled(&self, user_id: &str, message: &str) -> Result<()> {
        self.record(user_id, ReminderKind::Scheduled, message)
    }

    pub fn add_delivered(&self, user_id: &str, message: &str) -> Result<()> {
        self.record(user_id, ReminderKind::Delivered, message)
    }

    fn record(&self, user_id: &str, kind: ReminderKind, message: &str) -> Result<()> {
        let message = message.trim();
        let message = if message.is_empty() { "Lembrete" } else { message };
        let conn = self.db.lock().unwrap();
        conn.execute(
            "INSERT INTO reminder_history (user_id, kind, message, created_at_ms) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, kind.as_str(), message, Utc::now().timestamp_millis()],
        )?;
        self.trim(&conn, user_id, kind)?;
        Ok(())
    }

    /// Keeps only the most recent `MAX_PER_USER_PER_KIND` rows for
    /// `(user_id, kind)`.
    fn trim(&self, conn: &Connection, user_id: &str, kind: ReminderKind) -> Result<()> {
        conn.execute(
            "DELETE FROM reminder_history WHERE id IN (
                SELECT id FROM reminder_history
                WHERE user_id = ?1 AND kind = ?2
                ORDER BY created_at_ms DESC
                LIMIT -1 OFFSET ?3
            )",
            params![user_id, kind.as_str(), MAX_PER_USER_PER_KIND as i64],
        )?;
        Ok(())
    }

    pub fn get_last_scheduled(&self, user_id: &str) -> Result<Option<String>> {
        self.last_message(user_id, ReminderKind::Scheduled)
    }

    pub fn get_last_delivered(&self, user_id: &str) -> Result<Option<String>> {
        self.last_message(user_id, ReminderKind::Delivered)
    }

    fn last_message(&self, user_id: &str, kind: ReminderKind) -> Result<Option<String>> {
        let conn = self.db.lock().unwrap();
        let message = conn
            .query_row(
                "SELECT message FROM reminder_history
                 WHERE user_id = ?1 AND kind = ?2
                 ORDER BY created_at_ms DESC LIMIT 1",
                params![user_id, kind.as_str()],
                |row| row.get(0),
            )
            .ok();
        Ok(message)
    }

    /// Entries for `user_id`, optionally filtered by kind, newest first.
    pub fn list(&self, user_id: &str, kind: Option<ReminderKind>, limit: usize) -> Result<Vec<ReminderHistoryEntry>> {
        let conn = self.db.lock().unwrap();
        let mut stmt = match kind {
            Some(_) => conn.prepare(
                "SELECT kind, message, created_at_ms FROM reminder_history
                 WHERE user_id = ?1 AND kind = ?2
                 ORDER BY created_at_ms DESC LIMIT ?3",
            )?,
            None => conn.prepare(
                "SELECT kind, message, created_at_ms FROM reminder_history
                 WHERE user_id = ?1
                 ORDER BY created_at_ms DESC LIMIT ?3",
            )?,
        };

        let row_to_entry = |row: &rusqlite::Row| -> rusqlite::Result<ReminderHistoryEntry> {
            let kind_str: String = row.get(0)?;
            Ok(ReminderHistoryEntry {
                kind: if kind_str == "scheduled" {
                    ReminderKind::Scheduled
                } else {
                    ReminderKind::Delivered
                },
                message: row.get(1)?,
                created_at_ms: row.get(2)?,
            })
        };

        let rows = match kind {
            Some(k) => stmt.query_map(params![user_id, k.as_str(), limit as i64], row_to_entry)?,
            None => stmt.query_map(params![user_id, limit as i64], row_to_entry)?,
        };

        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ReminderHistoryStore {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        ReminderHistoryStore::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn records_and_returns_last_per_kind() {
        let store = store();
        store.add_scheduled("u1", "beber agua").unwrap();
        store.add_scheduled("u1", "ligar pro dentista").unwrap();
        store.add_delivered("u1", "beber agua").unwrap();

        assert_eq!(store.get_last_scheduled("u1").unwrap().as_deref(), Some("ligar pro dentista"));
        assert_eq!(store.get_last_delivered("u1").unwrap().as_deref(), Some("beber agua"));
        assert_eq!(store.get_last_scheduled("u2").unwrap(), None);
    }

    #[test]
    fn caps_at_max_per_kind() {
        let store = store();
        for i in 0..(MAX_PER_USER_PER_KIND + 5) {
            store.add_scheduled("u1", &format!("lembrete {i}")).unwrap();
        }
        let all = store.list("u1", Some(ReminderKind::Scheduled), 100).unwrap();
        assert_eq!(all.len(), MAX_PER_USER_PER_KIND);
        assert_eq!(all[0].message, format!("lembrete {}", MAX_PER_USER_PER_KIND + 4));
    }
}
