use rusqlite::Connection;

use crate::error::Result;

/// Initialise the sessions + messages tables. Safe to call on every
/// startup — idempotent via `IF NOT EXISTS`.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            session_key   TEXT PRIMARY KEY,
            message_count INTEGER NOT NULL DEFAULT 0,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        ) STRICT;

        CREATE TABLE IF NOT EXISTS session_messages (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            session_key  TEXT NOT NULL,
            role         TEXT NOT NULL,
            content      TEXT NOT NULL,
            timestamp    TEXT NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_session_messages_key
            ON session_messages(session_key, id);",
    )?;
    Ok(())
}
