use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::types::{QuietHours, User};
use zapista_core::types::Locale;

pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            language TEXT NOT NULL,
            timezone TEXT NOT NULL,
            quiet_start_hour INTEGER NOT NULL DEFAULT 0,
            quiet_end_hour INTEGER NOT NULL DEFAULT 0,
            default_lead_secs INTEGER NOT NULL,
            extra_leads_secs TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        ) STRICT;",
    )?;
    Ok(())
}

fn locale_str(l: Locale) -> &'static str {
    l.as_str()
}

fn parse_locale(s: &str) -> Locale {
    match s {
        "pt-BR" => Locale::PtBr,
        "pt-PT" => Locale::PtPt,
        "es" => Locale::Es,
        _ => Locale::En,
    }
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let extra_leads_json: String = row.get("extra_leads_secs")?;
    let extra_leads_secs: Vec<i64> = serde_json::from_str(&extra_leads_json).unwrap_or_default();
    let language: String = row.get("language")?;
    Ok(User {
        id: row.get("id")?,
        display_name: row.get("display_name")?,
        language: parse_locale(&language),
        timezone: row.get("timezone")?,
        quiet_hours: QuietHours {
            start_hour: row.get("quiet_start_hour")?,
            end_hour: row.get("quiet_end_hour")?,
        },
        default_lead_secs: row.get("default_lead_secs")?,
        extra_leads_secs,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Create a user with the phone-derived defaults (language from phone
/// prefix, default 15-minute lead, system default timezone).
pub fn create_user(
    conn: &Connection,
    id: &str,
    display_name: &str,
    language: Locale,
    timezone: &str,
) -> Result<User> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO users (id, display_name, language, timezone, quiet_start_hour, quiet_end_hour,
                             default_lead_secs, extra_leads_secs, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 0, 0, ?5, '[]', ?6, ?6)",
        params![
            id,
            display_name,
            locale_str(language),
            timezone,
            zapista_core::config::DEFAULT_PRE_EVENT_LEAD_SECS,
            now
        ],
    )?;
    get_user(conn, id)?.ok_or_else(|| crate::error::UserError::NotFound(id.to_string()))
}

pub fn get_user(conn: &Connection, id: &str) -> Result<Option<User>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM users WHERE id = ?1")?;
    let user = stmt
        .query_row(params![id], row_to_user)
        .optional()?;
    Ok(user)
}

pub fn set_timezone(conn: &Connection, id: &str, timezone: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE users SET timezone = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, timezone, now],
    )?;
    Ok(())
}

pub fn set_language(conn: &Connection, id: &str, language: Locale) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE users SET language = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, locale_str(language), now],
    )?;
    Ok(())
}

pub fn set_quiet_hours(conn: &Connection, id: &str, hours: &QuietHours) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE users SET quiet_start_hour = ?2, quiet_end_hour = ?3, updated_at = ?4 WHERE id = ?1",
        params![id, hours.start_hour, hours.end_hour, now],
    )?;
    Ok(())
}

pub fn set_leads(conn: &Connection, id: &str, default_lead_secs: i64, extra: &[i64]) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let extra_json = serde_json::to_string(extra)?;
    conn.execute(
        "UPDATE users SET default_lead_secs = ?2, extra_leads_secs = ?3, updated_at = ?4 WHERE id = ?1",
        params![id, default_lead_secs, extra_json, now],
    )?;
    Ok(())
}
