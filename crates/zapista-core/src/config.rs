use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NAMESPACE: &str = "zapista";
pub const DEFAULT_RATE_CAPACITY: u32 = 15;
pub const DEFAULT_RATE_WINDOW_SECS: u64 = 60;
pub const DEFAULT_GOD_MODE_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_GOD_MODE_LOCKOUT_MINUTES: i64 = 15;
pub const DEFAULT_PRE_EVENT_LEAD_SECS: i64 = 15 * 60;
pub const MIN_EVERY_MS: i64 = 1_800_000; // 30 minutes
pub const MAX_EVERY_MS: i64 = 30 * 24 * 60 * 60 * 1000; // 30 days

/// Top-level config (`zapista.toml` + `ZAPISTA_*` env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZapistaConfig {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

impl Default for ZapistaConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            database: DatabaseConfig::default(),
            admin: AdminConfig::default(),
            rate_limit: RateLimitConfig::default(),
            whatsapp: WhatsAppConfig::default(),
        }
    }
}

/// Outward WebSocket client config for the external WhatsApp bridge process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// `ZAPISTA_WHATSAPP_BRIDGE_URL` — the bridge's WebSocket endpoint.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
        }
    }
}

fn default_bridge_url() -> String {
    "ws://127.0.0.1:3001".to_string()
}

/// Message-bus configuration: Redis URL (enables Redis-backed queues) and
/// the key namespace used for both the outbound lists and the dedup set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// `REDIS_URL` — when set, outbound queues and inbound dedup use Redis.
    pub redis_url: Option<String>,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            namespace: default_namespace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `ZAPISTA_DATA` — data root; sqlite db + durable JSON stores live under it.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// `STRICT_HANDLERS` — when true, a handler's error aborts the turn
    /// instead of being logged and skipped.
    #[serde(default)]
    pub strict_handlers: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            strict_handlers: false,
        }
    }
}

impl DatabaseConfig {
    pub fn sqlite_path(&self) -> String {
        format!("{}/zapista.db", self.data_dir)
    }

    pub fn cron_store_path(&self) -> String {
        format!("{}/cron/jobs.json", self.data_dir)
    }

    pub fn lists_store_path(&self) -> String {
        format!("{}/lists.json", self.data_dir)
    }

    pub fn god_mode_path(&self) -> String {
        format!("{}/security/god_mode_lockout.json", self.data_dir)
    }

    pub fn mute_ledger_path(&self) -> String {
        format!("{}/muted.json", self.data_dir)
    }

    pub fn metrics_path(&self) -> String {
        format!("{}/server_metrics.json", self.data_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// `GOD_MODE_PASSWORD` — cleartext on load, hashed immediately, never logged.
    pub password: Option<String>,
    #[serde(default = "default_god_mode_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_god_mode_lockout_minutes")]
    pub lockout_minutes: i64,
    /// Statically allow-listed phone numbers, unioned at runtime with
    /// numbers added via the `#allow` admin command.
    #[serde(default)]
    pub allow_list: Vec<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: None,
            max_attempts: DEFAULT_GOD_MODE_MAX_ATTEMPTS,
            lockout_minutes: DEFAULT_GOD_MODE_LOCKOUT_MINUTES,
            allow_list: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_capacity")]
    pub capacity: u32,
    #[serde(default = "default_rate_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_RATE_CAPACITY,
            window_secs: DEFAULT_RATE_WINDOW_SECS,
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_god_mode_max_attempts() -> u32 {
    DEFAULT_GOD_MODE_MAX_ATTEMPTS
}

fn default_god_mode_lockout_minutes() -> i64 {
    DEFAULT_GOD_MODE_LOCKOUT_MINUTES
}

fn default_rate_capacity() -> u32 {
    DEFAULT_RATE_CAPACITY
}

fn default_rate_window_secs() -> u64 {
    DEFAULT_RATE_WINDOW_SECS
}

fn default_data_dir() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.zapista", home)
}

impl ZapistaConfig {
    /// Load config from a TOML file with `ZAPISTA_*` env var overrides.
    ///
    /// Checks, in order: explicit path argument, then `~/.zapista/zapista.toml`.
    /// A missing file is not an error — figment simply has nothing to merge
    /// from it, and defaults apply.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: ZapistaConfig = Figment::from(figment::providers::Serialized::defaults(
            ZapistaConfig::default(),
        ))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("ZAPISTA_").split("_"))
        .extract()
        .map_err(|e| crate::error::ZapistaError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.zapista/zapista.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = ZapistaConfig::default();
        assert_eq!(cfg.bus.namespace, "zapista");
        assert_eq!(cfg.admin.max_attempts, 5);
        assert_eq!(cfg.admin.lockout_minutes, 15);
        assert_eq!(cfg.rate_limit.capacity, 15);
    }

    #[test]
    fn data_dir_paths_are_namespaced_under_root() {
        let cfg = DatabaseConfig {
            data_dir: "/tmp/zapista-test".to_string(),
            strict_handlers: false,
        };
        assert_eq!(cfg.cron_store_path(), "/tmp/zapista-test/cron/jobs.json");
        assert_eq!(
            cfg.god_mode_path(),
            "/tmp/zapista-test/security/god_mode_lockout.json"
        );
    }
}
