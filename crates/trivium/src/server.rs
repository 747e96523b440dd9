//! `TriviumServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → registry/rooms, with
//! the content adapter injected at build time.

use std::sync::Arc;

use trivium_content::ContentSource;
use trivium_protocol::JsonCodec;
use trivium_room::{GlobalStats, RegistryConfig, RoomConfig, RoomRegistry};
use trivium_transport::{Listener, WsListener};

use crate::TriviumError;
use crate::handler::handle_connection;

/// Shared server state handed to every connection handler task.
pub(crate) struct ServerState<C: ContentSource> {
    pub(crate) registry: Arc<RoomRegistry>,
    pub(crate) content: C,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Trivium server.
///
/// # Example
///
/// ```rust,ignore
/// let server = TriviumServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .room_config(RoomConfig::default())
///     .build(my_content_source)
///     .await?;
/// server.run().await
/// ```
pub struct TriviumServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    registry_config: RegistryConfig,
}

impl TriviumServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            registry_config: RegistryConfig::default(),
        }
    }

    /// Sets the address to bind the listener to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the per-room configuration (phase durations, scoring, caps).
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets the registry configuration (room cap, channel sizing).
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// Binds the listener and assembles the server around the given
    /// content source.
    pub async fn build<C: ContentSource>(
        self,
        content: C,
    ) -> Result<TriviumServer<C>, TriviumError> {
        let listener = WsListener::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: RoomRegistry::new(self.registry_config, self.room_config),
            content,
            codec: JsonCodec,
        });

        Ok(TriviumServer { listener, state })
    }
}

impl Default for TriviumServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Trivium server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TriviumServer<C: ContentSource> {
    listener: WsListener,
    state: Arc<ServerState<C>>,
}

impl<C: ContentSource> TriviumServer<C> {
    /// Creates a new builder.
    pub fn builder() -> TriviumServerBuilder {
        TriviumServerBuilder::new()
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// The room registry, for embedding layers that query it directly
    /// (e.g. a landing page rendering [`GlobalStats`]).
    pub fn registry(&self) -> Arc<RoomRegistry> {
        Arc::clone(&self.state.registry)
    }

    /// Current platform-wide counters. O(1).
    pub fn global_stats(&self) -> GlobalStats {
        self.state.registry.global_stats()
    }

    /// Runs the accept loop: each accepted connection gets its own
    /// handler task. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), TriviumError> {
        tracing::info!("Trivium server running");

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
