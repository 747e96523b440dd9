//! # Trivium
//!
//! Real-time multiplayer quiz server.
//!
//! Trivium is server-authoritative: rooms live in memory as isolated
//! actors, the server validates every command against the room's phase and
//! the caller's authority, and clients only ever render what the server
//! broadcasts. Wire the server up with a [`ContentSource`] implementation
//! and run it:
//!
//! ```rust,no_run
//! use trivium::{TriviumServerBuilder, TriviumError};
//! use trivium_content::StaticContent;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), TriviumError> {
//!     let content = StaticContent::new();
//!     let server = TriviumServerBuilder::new()
//!         .bind("0.0.0.0:8080")
//!         .build(content)
//!         .await?;
//!     server.run().await
//! }
//! ```
//!
//! [`ContentSource`]: trivium_content::ContentSource

mod error;
mod handler;
mod server;

pub use error::TriviumError;
pub use server::{TriviumServer, TriviumServerBuilder};
