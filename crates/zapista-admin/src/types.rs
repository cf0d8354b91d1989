use serde::{Deserialize, Serialize};

/// Whether a chat currently sees God Mode's command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GodModeState {
    LockedOut,
    Unactivated,
    Activated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutEntry {
    pub count: u32,
    pub first_attempt_ms: i64,
    pub locked_until_ms: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GodModeDocument {
    #[serde(default)]
    pub activated: Vec<String>,
    #[serde(default)]
    pub lockouts: std::collections::HashMap<String, LockoutEntry>,
    #[serde(default)]
    pub allow_list: Vec<String>,
}

/// Mute ladder levels 1-6. Level 6 is `None` (permanent) — there is no
/// duration past it.
pub const MUTE_LEVEL_DURATIONS_MS: [Option<i64>; 6] = [
    Some(15 * 60_000),
    Some(30 * 60_000),
    Some(2 * 3_600_000),
    Some(24 * 3_600_000),
    Some(7 * 24 * 3_600_000),
    None,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuteEntry {
    pub level: u8,
    /// `None` once `level == 6` — permanently muted.
    pub muted_until_ms: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MuteDocument {
    #[serde(default)]
    pub entries: std::collections::HashMap<String, MuteEntry>,
}
