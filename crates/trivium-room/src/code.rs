//! Room code generation.
//!
//! Codes are 10 characters from the 62-symbol `[0-9A-Za-z]` alphabet — the
//! same shape as the platform's other shareable content codes. With room
//! counts many orders of magnitude below 62^10, a fresh draw collides with
//! a live room essentially never; the registry still checks and redraws.

use rand::{Rng, distr::Alphanumeric};
use trivium_protocol::RoomCode;

/// Length of every room code.
pub const ROOM_CODE_LEN: usize = 10;

/// Draws a random code. Uniqueness is the registry's job.
pub(crate) fn generate_code() -> RoomCode {
    let code: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(ROOM_CODE_LEN)
        .map(char::from)
        .collect();
    RoomCode(code)
}
