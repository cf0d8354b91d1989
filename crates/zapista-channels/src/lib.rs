pub mod channel;
pub mod deps;
pub mod error;
pub mod manager;
pub mod sent_mapping;
pub mod types;
pub mod whatsapp;

pub use channel::Channel;
pub use deps::{AccessControl, AdminPipeline, IcsImporter, RestartExecutor, SpeechToText};
pub use error::ChannelError;
pub use manager::ChannelManager;
pub use types::{BridgeInboundFrame, ChannelStatus, ReactionClass};
pub use whatsapp::{BridgeDeps, WhatsAppBridge};
