//! `zapista-admin` — the God Mode state machine and mute ladder (spec §4.7).

pub mod engine;
pub mod error;
pub mod store;
pub mod types;

pub use engine::{hash_password, AdminEngine, AdminEngineConfig};
pub use error::{AdminError, Result};
pub use types::GodModeState;
