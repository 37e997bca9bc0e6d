//! Relay client abstraction and multi-relay broadcast.
//!
//! Decouples the broadcast path from the WebSocket transport.
//! Production uses [`WsRelayClient`]; tests provide in-memory clients.

pub mod broadcast;
pub mod message;
pub mod ws;

pub use broadcast::{
    BroadcastConfig, BroadcastError, BroadcastReport, Broadcaster, RelayFailure,
};
pub use message::RelayMessage;
pub use ws::WsRelayClient;

use std::time::Duration;

use crate::event::SignedEvent;

/// Error type for a single relay attempt.
///
/// These never escape the broadcaster on their own; they are recorded per
/// relay and only the aggregate outcome propagates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("relay rejected event: {0}")]
    Rejected(String),
    #[error("connection closed before acknowledgment")]
    Closed,
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// What counts as a relay accepting an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckPolicy {
    /// Wait for an `OK` frame with `accepted = true` for this event id.
    #[default]
    Confirmed,
    /// A successful send is enough.
    Sent,
}

/// An open connection to one relay.
#[async_trait::async_trait]
pub trait RelayConnection: Send {
    /// Publish one event under the given acknowledgment policy.
    async fn publish(&mut self, event: &SignedEvent, ack: AckPolicy) -> Result<(), RelayError>;

    /// Close the connection. Errors are swallowed; there is nothing useful
    /// to do with them.
    async fn close(&mut self);
}

/// Opens connections to relays by URL.
#[async_trait::async_trait]
pub trait RelayClient: Send + Sync {
    type Connection: RelayConnection;

    /// Connect to the relay at `url`.
    async fn connect(&self, url: &str) -> Result<Self::Connection, RelayError>;
}
