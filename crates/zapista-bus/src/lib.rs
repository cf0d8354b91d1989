//! `zapista-bus` — the in-process message bus connecting channel adapters
//! to the agent loop.
//!
//! Two logical queues: inbound (single consumer, the agent loop) and
//! outbound (two priority lanes — `high` for cron deliveries, `normal` for
//! agent replies — each with potentially multiple channel consumers).
//! When `REDIS_URL` is configured, outbound publishing goes through Redis
//! first for durability; a feeder task drains it back into the same local
//! lanes, so [`bus::MessageBus::consume_outbound`] behaves identically
//! either way.

pub mod bus;
pub mod dedup;
pub mod error;
pub mod redis_backend;

pub use bus::MessageBus;
pub use error::{BusError, Result};
