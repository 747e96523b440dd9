//! Transport abstraction for Trivium.
//!
//! The orchestrator consumes an abstract bidirectional event channel per
//! client: "send these bytes to connection C" / "the next bytes from
//! connection C". The [`Listener`] and [`Connection`] traits capture that
//! contract; the reference deployment speaks WebSocket via
//! `tokio-tungstenite` (behind the default `websocket` feature).
//!
//! Frames carry one serialized protocol event each — framing is the
//! transport's job, interpretation is the protocol layer's.

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod ws;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use ws::{WsConnection, WsListener};

use std::fmt;

/// Opaque identifier for a live connection.
///
/// This is what the room layer records as a player's current connection
/// handle; a reconnecting client gets a fresh id, which is exactly how the
/// roster tells a stale binding from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Listener: Send + 'static {
    /// The connection type produced by this listener.
    type Connection: Connection;
    /// The error type for listener operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single bidirectional event channel.
pub trait Connection: Send + Sync + 'static {
    /// The error type for channel operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one event frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next event frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
