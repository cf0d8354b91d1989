use async_trait::async_trait;
use zapista_core::message::OutboundMessage;

use crate::{error::ChannelError, types::ChannelStatus};

/// Common interface implemented by every channel adapter. The only adapter
/// today is the WhatsApp bridge, but the trait keeps the manager and the
/// daemon's wiring decoupled from that one implementation.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Stable lowercase identifier for this channel (e.g. `"whatsapp"`).
    fn name(&self) -> &str;

    /// Establish the connection to the external service. The bridge
    /// adapter's own reconnect loop lives inside its `run` task, not here —
    /// this is a single connection attempt.
    async fn connect(&mut self) -> Result<(), ChannelError>;

    /// Gracefully close the connection.
    async fn disconnect(&mut self) -> Result<(), ChannelError>;

    /// Deliver a single outbound message to the channel.
    ///
    /// `&self` (shared reference) so a connected adapter can send
    /// concurrently without a mutable borrow.
    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError>;

    /// Return the current runtime status without blocking.
    fn status(&self) -> ChannelStatus;
}
