//! Core protocol types for Trivium's wire format.
//!
//! Every type here gets serialized to JSON, sent over a client's event
//! channel, and deserialized on the other side. Both event enums use
//! internally tagged serde representations with `snake_case` tags, so a
//! submission looks like:
//!
//! ```json
//! { "type": "submit_answer", "question_index": 2, "choice_index": 1 }
//! ```

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The durable, opaque identity a client presents when creating or joining
/// a room.
///
/// The platform's auth layer (out of scope here) either resolves a real user
/// id or lets the client mint an ephemeral one; the orchestrator trusts
/// whatever it is handed. The same token presented across reconnect attempts
/// is what makes identity continuity work, so tokens are credentials:
/// they appear in inbound events only and are never included in broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerToken(pub String);

/// Tokens can be long; logs only need a stable prefix.
impl fmt::Display for PlayerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.chars().count() > 12 {
            let head: String = self.0.chars().take(8).collect();
            write!(f, "{head}…")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A player's public identity inside one room.
///
/// Assigned in join order by the room, so it doubles as the deterministic
/// leaderboard tie-break. This is what broadcasts use to refer to players;
/// the durable [`PlayerToken`] stays between the client and the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// A shareable room code: 10 characters drawn from `[0-9A-Za-z]`, unique
/// among active rooms. Matches the identifier format used elsewhere in the
/// platform for shareable content codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a question collection held by the content collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub String);

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The quiz state machine's current phase.
///
/// ```text
/// LOBBY → QUESTION_ACTIVE → REVEAL → SCOREBOARD ─┬→ QUESTION_ACTIVE (next)
///                                                └→ GAME_OVER
/// ```
///
/// Transitions are driven exclusively by the owning room: host commands out
/// of `Lobby`, then deadline expiry or all-connected-answered for the timed
/// phases. Wire representation is SCREAMING_SNAKE_CASE (`"QUESTION_ACTIVE"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Lobby,
    QuestionActive,
    Reveal,
    Scoreboard,
    GameOver,
}

impl Phase {
    /// Returns `true` while a game is running (a question flow has started
    /// and not yet finished).
    pub fn is_in_game(&self) -> bool {
        matches!(self, Self::QuestionActive | Self::Reveal | Self::Scoreboard)
    }

    /// Returns `true` if this phase auto-advances on a deadline.
    /// `Lobby` and `GameOver` wait for commands (or eviction) instead.
    pub fn is_timed(&self) -> bool {
        self.is_in_game()
    }

    /// Returns `true` if answers are accepted in this phase.
    pub fn accepts_answers(&self) -> bool {
        matches!(self, Self::QuestionActive)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lobby => "LOBBY",
            Self::QuestionActive => "QUESTION_ACTIVE",
            Self::Reveal => "REVEAL",
            Self::Scoreboard => "SCOREBOARD",
            Self::GameOver => "GAME_OVER",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Game options
// ---------------------------------------------------------------------------

/// Host-selected options attached to `start_game`.
///
/// Both fields default to off, so clients may omit `options` entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOptions {
    /// Cap the number of questions taken from the collection snapshot.
    #[serde(default)]
    pub question_limit: Option<usize>,

    /// Randomize question order at snapshot time.
    #[serde(default)]
    pub shuffle_questions: bool,
}

// ---------------------------------------------------------------------------
// Inbound events (client → server)
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
///
/// `create_room` and `join_room` bind the connection to a room; all other
/// events are only valid while bound. Host-only events (`start_game`,
/// `skip_question`, `end_game`) are validated against the room's recorded
/// host token, not against anything in the event itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Open a new room with the sender as host and first player.
    CreateRoom {
        player_token: PlayerToken,
        player_name: String,
        #[serde(default)]
        player_avatar: Option<String>,
    },

    /// Join (or reconnect to) an existing room by code.
    JoinRoom {
        code: RoomCode,
        player_token: PlayerToken,
        player_name: String,
        #[serde(default)]
        player_avatar: Option<String>,
    },

    /// Host only: snapshot a collection's questions and begin the flow.
    StartGame {
        collection_id: CollectionId,
        #[serde(default)]
        options: GameOptions,
    },

    /// Submit a choice for the question at `question_index`.
    /// First write wins; duplicates are rejected.
    SubmitAnswer {
        question_index: usize,
        choice_index: usize,
    },

    /// Host only: end the answer window for the current question now.
    SkipQuestion,

    /// Host only: jump to the final leaderboard. Sent again from
    /// `GAME_OVER`, it dismisses the room entirely.
    EndGame,

    /// Leave the room for good (no reconnection grace).
    LeaveRoom,
}

// ---------------------------------------------------------------------------
// Outbound events (server → client)
// ---------------------------------------------------------------------------

/// A player's presentation data plus live score, as included in
/// `room_state` broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub score: u32,
    pub connected: bool,
}

/// One player's outcome for a single question, included in `answer_result`.
/// Every player in the room gets an entry; wrong or missing answers carry
/// `delta: 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDelta {
    pub id: PlayerId,
    pub delta: u32,
    pub correct: bool,
}

/// One row of a ranked leaderboard. `rank` is 1-based; ties are broken by
/// join order, so ranks are total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
}

/// Everything the server can tell a client.
///
/// Broadcast events (`room_state`, `question_started`, `answer_result`,
/// `leaderboard`, `game_over`) go to every connected player in a room.
/// `room_created` and `error` go to a single connection only.
///
/// There is no replay of missed events: a reconnecting client is
/// resynchronized with a fresh `room_state` snapshot. Deadlines are
/// expressed as milliseconds remaining at send time, so clients need no
/// clock synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Reply to `create_room`: the shareable code of the new room.
    RoomCreated { code: RoomCode },

    /// Authoritative room snapshot. Sent on every membership change and to
    /// reconnecting players as their resync mechanism.
    RoomState {
        phase: Phase,
        current_index: usize,
        #[serde(default)]
        deadline_ms: Option<u64>,
        players: Vec<PlayerSummary>,
    },

    /// A new answer window opened. `options` never includes the correct
    /// index — that is only disclosed by `answer_result`.
    QuestionStarted {
        question_index: usize,
        text: String,
        options: Vec<String>,
        deadline_ms: u64,
    },

    /// The answer window closed: correct choice plus per-player score deltas.
    AnswerResult {
        correct_index: usize,
        deltas: Vec<PlayerDelta>,
    },

    /// Standings after a question's reveal.
    Leaderboard { ranked: Vec<RankedEntry> },

    /// The quiz finished; final standings.
    GameOver { final_ranked: Vec<RankedEntry> },

    /// A per-request failure, delivered only to the originating connection.
    Error { kind: ErrorKind, message: String },
}

/// Machine-readable error categories carried by [`ServerEvent::Error`].
///
/// The UI layer decides how to render these; `message` is a human-readable
/// companion, never something to dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The registry is at its configured maximum of concurrent rooms.
    CapacityExceeded,
    /// No active room has that code.
    RoomNotFound,
    /// The room's player cap was reached.
    RoomFull,
    /// The command is illegal for the room's current phase, or the caller
    /// lacks the authority to issue it.
    InvalidTransition,
    /// Out-of-range choice index, wrong question index, or a duplicate
    /// submission.
    InvalidAnswer,
    /// The content collaborator knows no such collection.
    ContentNotFound,
    /// The collection exists but holds no questions.
    ContentEmpty,
    /// The inbound payload could not be decoded as a [`ClientEvent`].
    Malformed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CapacityExceeded => "capacity_exceeded",
            Self::RoomNotFound => "room_not_found",
            Self::RoomFull => "room_full",
            Self::InvalidTransition => "invalid_transition",
            Self::InvalidAnswer => "invalid_answer",
            Self::ContentNotFound => "content_not_found",
            Self::ContentEmpty => "content_empty",
            Self::Malformed => "malformed",
        };
        write!(f, "{name}")
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire contract defines exact JSON shapes; these tests pin them
    //! down because a mismatch means the browser client can't parse our
    //! events (or worse, we silently reject theirs).

    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_player_token_serializes_as_plain_string() {
        let json = serde_json::to_string(&PlayerToken("abc123".into())).unwrap();
        assert_eq!(json, "\"abc123\"");
    }

    #[test]
    fn test_player_token_display_truncates_long_tokens() {
        let long = PlayerToken("0123456789abcdef0123".into());
        assert_eq!(long.to_string(), "01234567…");

        let short = PlayerToken("guest-42".into());
        assert_eq!(short.to_string(), "guest-42");
    }

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn test_room_code_round_trip() {
        let code = RoomCode("aB3xY9kQ2m".into());
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"aB3xY9kQ2m\"");
        let back: RoomCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
    }

    // =====================================================================
    // Phase
    // =====================================================================

    #[test]
    fn test_phase_serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&Phase::QuestionActive).unwrap();
        assert_eq!(json, "\"QUESTION_ACTIVE\"");
        let json = serde_json::to_string(&Phase::GameOver).unwrap();
        assert_eq!(json, "\"GAME_OVER\"");
    }

    #[test]
    fn test_phase_is_timed_only_mid_game() {
        assert!(!Phase::Lobby.is_timed());
        assert!(Phase::QuestionActive.is_timed());
        assert!(Phase::Reveal.is_timed());
        assert!(Phase::Scoreboard.is_timed());
        assert!(!Phase::GameOver.is_timed());
    }

    #[test]
    fn test_phase_accepts_answers_only_while_question_active() {
        assert!(Phase::QuestionActive.accepts_answers());
        assert!(!Phase::Lobby.accepts_answers());
        assert!(!Phase::Reveal.accepts_answers());
        assert!(!Phase::Scoreboard.accepts_answers());
        assert!(!Phase::GameOver.accepts_answers());
    }

    // =====================================================================
    // ClientEvent
    // =====================================================================

    #[test]
    fn test_client_event_create_room_json_format() {
        let ev = ClientEvent::CreateRoom {
            player_token: PlayerToken("h1".into()),
            player_name: "Ada".into(),
            player_avatar: None,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "create_room");
        assert_eq!(json["player_token"], "h1");
        assert_eq!(json["player_name"], "Ada");
    }

    #[test]
    fn test_client_event_join_room_round_trip() {
        let ev = ClientEvent::JoinRoom {
            code: RoomCode("ABC1234XYZ".into()),
            player_token: PlayerToken("p1".into()),
            player_name: "Grace".into(),
            player_avatar: Some("https://cdn/avatars/7.png".into()),
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let back: ClientEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn test_client_event_start_game_options_default_when_missing() {
        // Clients that don't care about options can omit the field.
        let json = r#"{"type": "start_game", "collection_id": "geo-101"}"#;
        let ev: ClientEvent = serde_json::from_str(json).unwrap();
        match ev {
            ClientEvent::StartGame { collection_id, options } => {
                assert_eq!(collection_id, CollectionId("geo-101".into()));
                assert_eq!(options, GameOptions::default());
            }
            other => panic!("expected StartGame, got {other:?}"),
        }
    }

    #[test]
    fn test_client_event_submit_answer_json_format() {
        let ev = ClientEvent::SubmitAnswer {
            question_index: 2,
            choice_index: 1,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "submit_answer");
        assert_eq!(json["question_index"], 2);
        assert_eq!(json["choice_index"], 1);
    }

    #[test]
    fn test_client_event_unit_variants_round_trip() {
        for ev in [
            ClientEvent::SkipQuestion,
            ClientEvent::EndGame,
            ClientEvent::LeaveRoom,
        ] {
            let bytes = serde_json::to_vec(&ev).unwrap();
            let back: ClientEvent = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(back, ev);
        }
    }

    #[test]
    fn test_client_event_unknown_type_returns_error() {
        let unknown = r#"{"type": "fly_to_moon", "speed": 9000}"#;
        let result: Result<ClientEvent, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    // =====================================================================
    // ServerEvent
    // =====================================================================

    #[test]
    fn test_server_event_room_created_json_format() {
        let ev = ServerEvent::RoomCreated {
            code: RoomCode("ABC1234XYZ".into()),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "room_created");
        assert_eq!(json["code"], "ABC1234XYZ");
    }

    #[test]
    fn test_server_event_room_state_json_format() {
        let ev = ServerEvent::RoomState {
            phase: Phase::Lobby,
            current_index: 0,
            deadline_ms: None,
            players: vec![PlayerSummary {
                id: PlayerId(1),
                name: "Ada".into(),
                avatar: None,
                score: 0,
                connected: true,
            }],
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "room_state");
        assert_eq!(json["phase"], "LOBBY");
        assert_eq!(json["players"][0]["id"], 1);
        assert_eq!(json["players"][0]["connected"], true);
        // Absent avatar is omitted, not null.
        assert!(json["players"][0].get("avatar").is_none());
    }

    #[test]
    fn test_server_event_question_started_hides_nothing_it_shouldnt() {
        // question_started carries text and options only — no field could
        // leak the correct index even by accident.
        let ev = ServerEvent::QuestionStarted {
            question_index: 0,
            text: "Capital of France?".into(),
            options: vec!["Paris".into(), "Lyon".into(), "Nice".into(), "Lille".into()],
            deadline_ms: 20_000,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "question_started");
        assert!(json.get("correct_index").is_none());
        assert_eq!(json["options"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_server_event_answer_result_round_trip() {
        let ev = ServerEvent::AnswerResult {
            correct_index: 0,
            deltas: vec![
                PlayerDelta { id: PlayerId(1), delta: 180, correct: true },
                PlayerDelta { id: PlayerId(2), delta: 0, correct: false },
            ],
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let back: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn test_server_event_leaderboard_round_trip() {
        let ev = ServerEvent::Leaderboard {
            ranked: vec![
                RankedEntry { rank: 1, id: PlayerId(2), name: "Grace".into(), score: 200 },
                RankedEntry { rank: 2, id: PlayerId(1), name: "Ada".into(), score: 180 },
            ],
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let back: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn test_server_event_error_json_format() {
        let ev = ServerEvent::Error {
            kind: ErrorKind::InvalidTransition,
            message: "only the host may start the game".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["kind"], "invalid_transition");
    }

    #[test]
    fn test_error_kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&ErrorKind::CapacityExceeded).unwrap();
        assert_eq!(json, "\"capacity_exceeded\"");
        let json = serde_json::to_string(&ErrorKind::ContentEmpty).unwrap();
        assert_eq!(json, "\"content_empty\"");
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<ClientEvent, _> = serde_json::from_slice(garbage);
        assert!(result.is_err());
    }
}
