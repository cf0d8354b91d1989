use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use zapista_channels::{AccessControl, AdminPipeline};

use crate::error::Result;
use crate::store;
use crate::types::{GodModeDocument, GodModeState, LockoutEntry, MuteDocument, MuteEntry, MUTE_LEVEL_DURATIONS_MS};

const WINDOW_MS: i64 = 15 * 60_000;

pub struct AdminEngineConfig {
    pub god_mode_path: String,
    pub mute_path: String,
    /// SHA-256 hash of the activation password. `None` disables God Mode
    /// entirely (every `#` input is silently ignored).
    pub password_hash: Option<String>,
    pub max_attempts: u32,
    pub lockout_ms: i64,
    pub static_allow_list: Vec<String>,
}

/// Owns the God Mode state machine and the mute ladder: the two pieces of
/// admin-only persisted state (spec §4.7).
pub struct AdminEngine {
    god_mode_path: String,
    mute_path: String,
    password_hash: Option<String>,
    max_attempts: u32,
    lockout_ms: i64,
    god_mode: Mutex<GodModeDocument>,
    mute: Mutex<MuteDocument>,
    static_allow_list: HashSet<String>,
}

pub fn hash_password(cleartext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cleartext.as_bytes());
    hex::encode(hasher.finalize())
}

impl AdminEngine {
    pub fn load(cfg: AdminEngineConfig) -> Result<Self> {
        let god_mode: GodModeDocument = store::load(&cfg.god_mode_path)?;
        let mute: MuteDocument = store::load(&cfg.mute_path)?;
        Ok(Self {
            god_mode_path: cfg.god_mode_path,
            mute_path: cfg.mute_path,
            password_hash: cfg.password_hash,
            max_attempts: cfg.max_attempts,
            lockout_ms: cfg.lockout_ms,
            god_mode: Mutex::new(god_mode),
            mute: Mutex::new(mute),
            static_allow_list: cfg.static_allow_list.into_iter().collect(),
        })
    }

    fn save_god_mode(&self, doc: &GodModeDocument) {
        if let Err(e) = store::save(&self.god_mode_path, doc) {
            warn!("failed to persist god-mode store: {e}");
        }
    }

    fn save_mute(&self, doc: &MuteDocument) {
        if let Err(e) = store::save(&self.mute_path, doc) {
            warn!("failed to persist mute ledger: {e}");
        }
    }

    /// Current state for `chat_id`: locked out takes priority over
    /// activation, per spec §4.7.
    pub fn state(&self, chat_id: &str) -> GodModeState {
        let doc = self.god_mode.lock().unwrap();
        if is_locked_out(&doc, chat_id) {
            return GodModeState::LockedOut;
        }
        if doc.activated.iter().any(|c| c == chat_id) {
            GodModeState::Activated
        } else {
            GodModeState::Unactivated
        }
    }

    fn record_failed_attempt(&self, chat_id: &str) {
        let mut doc = self.god_mode.lock().unwrap();
        let now = Utc::now().timestamp_millis();
        let entry = doc
            .lockouts
            .entry(chat_id.to_string())
            .or_insert(LockoutEntry {
                count: 0,
                first_attempt_ms: now,
                locked_until_ms: 0,
            });

        if entry.locked_until_ms > now {
            return;
        }
        if now - entry.first_attempt_ms > WINDOW_MS {
            entry.count = 0;
            entry.first_attempt_ms = now;
        }
        entry.count += 1;
        if entry.count >= self.max_attempts {
            entry.locked_until_ms = now + self.lockout_ms;
            warn!(chat_id, attempts = entry.count, "god mode lockout triggered");
        }
        self.save_god_mode(&doc);
    }

    fn clear_failed_attempts(&self, chat_id: &str) {
        let mut doc = self.god_mode.lock().unwrap();
        doc.lockouts.remove(chat_id);
        self.save_god_mode(&doc);
    }

    fn activate(&self, chat_id: &str) {
        let mut doc = self.god_mode.lock().unwrap();
        if !doc.activated.iter().any(|c| c == chat_id) {
            doc.activated.push(chat_id.to_string());
        }
        self.save_god_mode(&doc);
    }

    fn deactivate(&self, chat_id: &str) {
        let mut doc = self.god_mode.lock().unwrap();
        doc.activated.retain(|c| c != chat_id);
        self.save_god_mode(&doc);
    }

    fn allow_runtime(&self, phone: &str) {
        let mut doc = self.god_mode.lock().unwrap();
        if !doc.allow_list.iter().any(|p| p == phone) {
            doc.allow_list.push(phone.to_string());
        }
        self.save_god_mode(&doc);
    }

    /// Advance the mute ladder one level for `phone`. Level 6 has no
    /// duration field — it is final.
    pub fn mute(&self, phone: &str) -> u8 {
        let mut doc = self.mute.lock().unwrap();
        let now = Utc::now().timestamp_millis();
        let entry = doc.entries.entry(phone.to_string()).or_insert(MuteEntry {
            level: 0,
            muted_until_ms: Some(now),
        });
        let next_level = (entry.level + 1).min(6);
        let duration = MUTE_LEVEL_DURATIONS_MS[(next_level - 1) as usize];
        entry.level = next_level;
        entry.muted_until_ms = duration.map(|d| now + d);
        self.save_mute(&doc);
        next_level
    }

    pub fn unmute(&self, phone: &str) -> bool {
        let mut doc = self.mute.lock().unwrap();
        let removed = doc.entries.remove(phone).is_some();
        if removed {
            self.save_mute(&doc);
        }
        removed
    }

    fn admin_menu(&self) -> String {
        "God-mode ativo. Comandos: #mute <numero>, #unmute <numero>, #allow <numero>, #quit".to_string()
    }

    fn dispatch_command(&self, command: &str, args: &str) -> String {
        match command {
            "mute" => {
                let phone = args.trim();
                if phone.is_empty() {
                    return "uso: #mute <numero>".to_string();
                }
                let level = self.mute(phone);
                format!("numero {phone} silenciado (nivel {level})")
            }
            "unmute" => {
                let phone = args.trim();
                if phone.is_empty() {
                    return "uso: #unmute <numero>".to_string();
                }
                if self.unmute(phone) {
                    format!("numero {phone} dessilenciado")
                } else {
                    format!("numero {phone} nao estava silenciado")
                }
            }
            "allow" => {
                let phone = args.trim();
                if phone.is_empty() {
                    return "uso: #allow <numero>".to_string();
                }
                self.allow_runtime(phone);
                format!("numero {phone} liberado")
            }
            other => format!("comando desconhecido: #{other}"),
        }
    }
}

fn is_locked_out(doc: &GodModeDocument, chat_id: &str) -> bool {
    let Some(entry) = doc.lockouts.get(chat_id) else {
        return false;
    };
    let now = Utc::now().timestamp_millis();
    if entry.locked_until_ms > now {
        return true;
    }
    false
}

#[async_trait]
impl AdminPipeline for AdminEngine {
    async fn handle(&self, chat_id: &str, content: &str) -> Option<String> {
        let Some(password_hash) = &self.password_hash else {
            return None;
        };
        let rest = content.strip_prefix('#')?;

        match self.state(chat_id) {
            GodModeState::LockedOut => None,
            GodModeState::Unactivated => {
                if hash_password(rest) == *password_hash {
                    self.activate(chat_id);
                    self.clear_failed_attempts(chat_id);
                    info!(chat_id, "god mode activated");
                    Some(self.admin_menu())
                } else {
                    self.record_failed_attempt(chat_id);
                    None
                }
            }
            GodModeState::Activated => {
                let mut parts = rest.splitn(2, ' ');
                let command = parts.next().unwrap_or("").trim().to_lowercase();
                let args = parts.next().unwrap_or("");
                if command == "quit" {
                    self.deactivate(chat_id);
                    Some("God mode encerrado.".to_string())
                } else {
                    Some(self.dispatch_command(&command, args))
                }
            }
        }
    }
}

impl AccessControl for AdminEngine {
    fn is_allowed(&self, chat_id: &str) -> bool {
        if self.static_allow_list.is_empty() {
            // No static allow-list configured means allow-list enforcement
            // is off; everyone not muted is served.
            return true;
        }
        if self.static_allow_list.contains(chat_id) {
            return true;
        }
        let doc = self.god_mode.lock().unwrap();
        doc.allow_list.iter().any(|p| p == chat_id)
    }

    fn is_muted(&self, chat_id: &str) -> bool {
        let doc = self.mute.lock().unwrap();
        let Some(entry) = doc.entries.get(chat_id) else {
            return false;
        };
        match entry.muted_until_ms {
            None => true,
            Some(until) => until > Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(tag: &str) -> AdminEngine {
        let dir = std::env::temp_dir().join(format!("zapista-admin-test-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        AdminEngine::load(AdminEngineConfig {
            god_mode_path: dir.join("god_mode.json").to_string_lossy().into_owned(),
            mute_path: dir.join("muted.json").to_string_lossy().into_owned(),
            password_hash: Some(hash_password("segredo")),
            max_attempts: 5,
            lockout_ms: 15 * 60_000,
            static_allow_list: Vec::new(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn wrong_password_five_times_locks_out() {
        let engine = engine("lockout");
        for _ in 0..5 {
            assert_eq!(engine.handle("A", "#errada").await, None);
        }
        assert_eq!(engine.state("A"), GodModeState::LockedOut);
        // Correct password still silent while locked out.
        assert_eq!(engine.handle("A", "#segredo").await, None);
    }

    #[tokio::test]
    async fn correct_password_activates_and_quit_deactivates() {
        let engine = engine("activate");
        let reply = engine.handle("A", "#segredo").await;
        assert!(reply.is_some());
        assert_eq!(engine.state("A"), GodModeState::Activated);

        let reply = engine.handle("A", "#quit").await;
        assert_eq!(reply.as_deref(), Some("God mode encerrado."));
        assert_eq!(engine.state("A"), GodModeState::Unactivated);
    }

    #[test]
    fn mute_ladder_advances_and_permanent_on_level_six() {
        let engine = engine("mute");
        for expected in 1..=6 {
            let level = engine.mute("555");
            assert_eq!(level, expected);
        }
        assert!(AccessControl::is_muted(&engine, "555"));
    }
}
