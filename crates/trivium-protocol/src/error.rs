//! Error types for the protocol layer.
//!
//! Each Trivium crate defines its own error enum, so a `ProtocolError`
//! always means the problem is in serialization/deserialization, not in
//! networking or room logic.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    /// Common causes: malformed JSON, missing required fields, an unknown
    /// `type` tag, or truncated frames.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The event decoded fine but is invalid at the protocol level —
    /// e.g. the first event on a connection was not `create_room`/`join_room`.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}
