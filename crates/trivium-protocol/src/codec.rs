//! Codec trait and implementations for serializing/deserializing events.
//!
//! The protocol layer doesn't care HOW events become bytes — anything
//! implementing [`Codec`] will do. We ship [`JsonCodec`] (human-readable,
//! matches what browser clients speak); a compact binary codec could be
//! added later without touching handler or room code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts protocol values to bytes and back.
///
/// `Send + Sync + 'static` because the codec is shared across every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// JSON events are inspectable in browser DevTools and server logs, which
/// is exactly what you want while debugging a live quiz flow. Behind the
/// default `json` feature flag.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientEvent, PlayerToken};

    #[test]
    fn test_json_codec_round_trips_client_event() {
        let codec = JsonCodec;
        let ev = ClientEvent::CreateRoom {
            player_token: PlayerToken("h1".into()),
            player_name: "Ada".into(),
            player_avatar: None,
        };

        let bytes = codec.encode(&ev).unwrap();
        let back: ClientEvent = codec.decode(&bytes).unwrap();

        assert_eq!(back, ev);
    }

    #[test]
    fn test_json_codec_decode_wrong_shape_returns_error() {
        let codec = JsonCodec;
        let result: Result<ClientEvent, _> = codec.decode(br#"{"name": "hello"}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
