use std::collections::HashMap;

use tracing::{error, info, warn};

use crate::{channel::Channel, types::ChannelStatus};

/// Registry of channel adapters, keyed by [`Channel::name`].
///
/// Each adapter owns its own reconnect strategy (the WhatsApp bridge client
/// sleeps a flat 5 s between attempts and reconnects indefinitely); the
/// manager just connects everything once at startup and aggregates status.
pub struct ChannelManager {
    channels: HashMap<String, Box<dyn Channel + Send + Sync>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    /// Register a channel adapter. Replaces any existing adapter under the
    /// same name.
    pub fn register(&mut self, channel: Box<dyn Channel + Send + Sync>) {
        let name = channel.name().to_string();
        info!(channel = %name, "registering channel adapter");
        self.channels.insert(name, channel);
    }

    /// Connect every registered channel once. Failures are logged; the
    /// adapter itself is responsible for any subsequent reconnection.
    pub async fn connect_all(&mut self) {
        for (name, channel) in self.channels.iter_mut() {
            info!(channel = %name, "connecting channel");
            if let Err(e) = channel.connect().await {
                error!(channel = %name, error = %e, "initial channel connect failed");
            }
        }
    }

    pub async fn disconnect_all(&mut self) {
        for (name, channel) in self.channels.iter_mut() {
            info!(channel = %name, "disconnecting channel");
            if let Err(e) = channel.disconnect().await {
                warn!(channel = %name, error = %e, "error while disconnecting channel");
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&(dyn Channel + Send + Sync)> {
        self.channels.get(name).map(|b| b.as_ref())
    }

    /// Current status of every registered channel, sorted by name for
    /// deterministic output.
    pub fn statuses(&self) -> Vec<(String, ChannelStatus)> {
        let mut result: Vec<(String, ChannelStatus)> = self
            .channels
            .iter()
            .map(|(name, ch)| (name.clone(), ch.status()))
            .collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}

impl Default for ChannelManager {
    fn default() -> Self {
        Self::new()
    }
}
