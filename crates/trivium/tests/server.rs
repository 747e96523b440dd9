//! End-to-end tests: real WebSocket clients against a running server.
//!
//! Phase durations are shrunk to tens of milliseconds so a full game
//! plays out quickly in real time; the answer window stays generous
//! because every test answers (or skips) explicitly.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use trivium::TriviumServerBuilder;
use trivium_content::{Question, StaticContent};
use trivium_protocol::{
    ClientEvent, CollectionId, ErrorKind, GameOptions, Phase, PlayerToken,
    RoomCode, ServerEvent,
};
use trivium_room::RoomConfig;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn geography() -> Vec<Question> {
    vec![
        Question {
            text: "Capital of France?".into(),
            options: vec!["Paris".into(), "Lyon".into(), "Nice".into(), "Lille".into()],
            correct_index: 0,
        },
        Question {
            text: "Longest river?".into(),
            options: vec!["Amazon".into(), "Nile".into(), "Yangtze".into(), "Danube".into()],
            correct_index: 1,
        },
    ]
}

fn fast_rooms() -> RoomConfig {
    RoomConfig {
        answer_window: Duration::from_secs(30),
        reveal_duration: Duration::from_millis(100),
        scoreboard_duration: Duration::from_millis(100),
        reconnect_grace: Duration::from_secs(5),
        sweep_interval: Duration::from_millis(50),
        ..RoomConfig::default()
    }
}

/// Starts a server on a random port and returns its address plus the
/// registry (the stats integration point).
async fn start_server() -> (String, std::sync::Arc<trivium_room::RoomRegistry>) {
    let content = StaticContent::new().with_collection("geo", geography());
    let server = TriviumServerBuilder::new()
        .bind("127.0.0.1:0")
        .room_config(fast_rooms())
        .build(content)
        .await
        .expect("server should build");

    let addr = server.local_addr().expect("local addr").to_string();
    let registry = server.registry();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, registry)
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, event: &ClientEvent) {
    let json = serde_json::to_string(event).expect("encode");
    ws.send(Message::Text(json.into())).await.expect("send");
}

async fn recv_event(ws: &mut ClientWs) -> ServerEvent {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timed out waiting for event")
        .expect("stream ended")
        .expect("ws error");
    serde_json::from_slice(&msg.into_data()).expect("decode server event")
}

/// Receives events until `f` extracts a value.
async fn recv_until<T>(
    ws: &mut ClientWs,
    f: impl Fn(ServerEvent) -> Option<T>,
) -> T {
    for _ in 0..50 {
        if let Some(v) = f(recv_event(ws).await) {
            return v;
        }
    }
    panic!("expected event never arrived");
}

/// Asserts that no event arrives within `ms` milliseconds.
async fn expect_silence(ws: &mut ClientWs, ms: u64) {
    let got = tokio::time::timeout(Duration::from_millis(ms), ws.next()).await;
    assert!(got.is_err(), "expected silence, got {got:?}");
}

fn create_room_event(token: &str, name: &str) -> ClientEvent {
    ClientEvent::CreateRoom {
        player_token: PlayerToken(token.into()),
        player_name: name.into(),
        player_avatar: None,
    }
}

fn join_room_event(code: &RoomCode, token: &str, name: &str) -> ClientEvent {
    ClientEvent::JoinRoom {
        code: code.clone(),
        player_token: PlayerToken(token.into()),
        player_name: name.into(),
        player_avatar: None,
    }
}

fn start_game_event(collection: &str) -> ClientEvent {
    ClientEvent::StartGame {
        collection_id: CollectionId(collection.into()),
        options: GameOptions::default(),
    }
}

fn answer_event(question_index: usize, choice_index: usize) -> ClientEvent {
    ClientEvent::SubmitAnswer {
        question_index,
        choice_index,
    }
}

/// Creates a room and returns its code.
async fn create_room(ws: &mut ClientWs, token: &str, name: &str) -> RoomCode {
    send(ws, &create_room_event(token, name)).await;
    recv_until(ws, |ev| match ev {
        ServerEvent::RoomCreated { code } => Some(code),
        _ => None,
    })
    .await
}

// =========================================================================
// Room creation and joining
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_code_and_lobby_state() {
    let (addr, _registry) = start_server().await;
    let mut host = connect(&addr).await;

    send(&mut host, &create_room_event("h1", "Host")).await;

    match recv_event(&mut host).await {
        ServerEvent::RoomCreated { code } => {
            assert_eq!(code.0.len(), 10);
            assert!(code.0.chars().all(|c| c.is_ascii_alphanumeric()));
        }
        other => panic!("expected room_created, got {other:?}"),
    }
    match recv_event(&mut host).await {
        ServerEvent::RoomState { phase, players, deadline_ms, .. } => {
            assert_eq!(phase, Phase::Lobby);
            assert!(deadline_ms.is_none(), "no deadline in the lobby");
            assert_eq!(players.len(), 1);
            assert_eq!(players[0].name, "Host");
            assert!(players[0].connected);
        }
        other => panic!("expected room_state, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_unknown_code_yields_room_not_found() {
    let (addr, _registry) = start_server().await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        &join_room_event(&RoomCode("NoSuchRoom".into()), "p1", "Ada"),
    )
    .await;

    match recv_event(&mut ws).await {
        ServerEvent::Error { kind, .. } => assert_eq!(kind, ErrorKind::RoomNotFound),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_broadcasts_fresh_roster_to_everyone() {
    let (addr, _registry) = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host, "h1", "Host").await;

    let mut p1 = connect(&addr).await;
    send(&mut p1, &join_room_event(&code, "p1", "Ada")).await;

    // Both sides converge on a two-player lobby roster.
    for ws in [&mut host, &mut p1] {
        let players = recv_until(ws, |ev| match ev {
            ServerEvent::RoomState { players, .. } if players.len() == 2 => Some(players),
            _ => None,
        })
        .await;
        assert!(players.iter().any(|p| p.name == "Host"));
        assert!(players.iter().any(|p| p.name == "Ada"));
    }
}

#[tokio::test]
async fn test_malformed_payload_yields_error() {
    let (addr, _registry) = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Text("this is not an event".into()))
        .await
        .expect("send");

    match recv_event(&mut ws).await {
        ServerEvent::Error { kind, .. } => assert_eq!(kind, ErrorKind::Malformed),
        other => panic!("expected error, got {other:?}"),
    }
}

// =========================================================================
// Game flow
// =========================================================================

#[tokio::test]
async fn test_full_game_flow_over_websockets() {
    let (addr, _registry) = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host, "h1", "Host").await;

    let mut p1 = connect(&addr).await;
    send(&mut p1, &join_room_event(&code, "p1", "Ada")).await;
    recv_until(&mut p1, |ev| matches!(ev, ServerEvent::RoomState { .. }).then_some(())).await;

    send(&mut host, &start_game_event("geo")).await;

    // Question 0 reaches both players, with the full window ahead.
    for ws in [&mut host, &mut p1] {
        let (index, text, deadline_ms) = recv_until(ws, |ev| match ev {
            ServerEvent::QuestionStarted { question_index, text, deadline_ms, .. } => {
                Some((question_index, text, deadline_ms))
            }
            _ => None,
        })
        .await;
        assert_eq!(index, 0);
        assert_eq!(text, "Capital of France?");
        assert!(deadline_ms > 0 && deadline_ms <= 30_000);
    }

    // Both answer correctly; the room advances without waiting out the
    // 30-second window.
    send(&mut host, &answer_event(0, 0)).await;
    send(&mut p1, &answer_event(0, 0)).await;

    let deltas = recv_until(&mut host, |ev| match ev {
        ServerEvent::AnswerResult { correct_index, deltas } => {
            assert_eq!(correct_index, 0);
            Some(deltas)
        }
        _ => None,
    })
    .await;
    assert_eq!(deltas.len(), 2);
    assert!(deltas.iter().all(|d| d.correct && d.delta > 0));

    let ranked = recv_until(&mut host, |ev| match ev {
        ServerEvent::Leaderboard { ranked } => Some(ranked),
        _ => None,
    })
    .await;
    assert_eq!(ranked.len(), 2);
    assert!(ranked.iter().all(|r| r.score > 0));

    // Question 1; both miss it (correct is 1).
    let index = recv_until(&mut host, |ev| match ev {
        ServerEvent::QuestionStarted { question_index, .. } => Some(question_index),
        _ => None,
    })
    .await;
    assert_eq!(index, 1);

    send(&mut host, &answer_event(1, 0)).await;
    send(&mut p1, &answer_event(1, 2)).await;

    let deltas = recv_until(&mut host, |ev| match ev {
        ServerEvent::AnswerResult { deltas, .. } => Some(deltas),
        _ => None,
    })
    .await;
    assert!(deltas.iter().all(|d| !d.correct && d.delta == 0));

    // Final standings for both participants.
    for ws in [&mut host, &mut p1] {
        let final_ranked = recv_until(ws, |ev| match ev {
            ServerEvent::GameOver { final_ranked } => Some(final_ranked),
            _ => None,
        })
        .await;
        assert_eq!(final_ranked.len(), 2);
        assert_eq!(final_ranked[0].rank, 1);
        assert_eq!(final_ranked[1].rank, 2);
    }
}

#[tokio::test]
async fn test_non_host_start_rejected_to_caller_only() {
    let (addr, _registry) = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host, "h1", "Host").await;

    let mut p1 = connect(&addr).await;
    send(&mut p1, &join_room_event(&code, "p1", "Ada")).await;
    recv_until(&mut p1, |ev| matches!(ev, ServerEvent::RoomState { .. }).then_some(())).await;
    // Drain the host's copy of the join broadcast.
    recv_until(&mut host, |ev| {
        matches!(ev, ServerEvent::RoomState { ref players, .. } if players.len() == 2)
            .then_some(())
    })
    .await;

    send(&mut p1, &start_game_event("geo")).await;

    match recv_event(&mut p1).await {
        ServerEvent::Error { kind, .. } => assert_eq!(kind, ErrorKind::InvalidTransition),
        other => panic!("expected error, got {other:?}"),
    }
    // Nothing reaches the host, and the room is still in its lobby.
    expect_silence(&mut host, 300).await;
}

#[tokio::test]
async fn test_content_failure_keeps_lobby_and_reaches_host_only() {
    let (addr, _registry) = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host, "h1", "Host").await;

    let mut p1 = connect(&addr).await;
    send(&mut p1, &join_room_event(&code, "p1", "Ada")).await;
    recv_until(&mut p1, |ev| matches!(ev, ServerEvent::RoomState { .. }).then_some(())).await;
    recv_until(&mut host, |ev| {
        matches!(ev, ServerEvent::RoomState { ref players, .. } if players.len() == 2)
            .then_some(())
    })
    .await;

    send(&mut host, &start_game_event("no-such-collection")).await;

    match recv_event(&mut host).await {
        ServerEvent::Error { kind, .. } => assert_eq!(kind, ErrorKind::ContentNotFound),
        other => panic!("expected error, got {other:?}"),
    }
    expect_silence(&mut p1, 300).await;

    // The lobby is intact: a correct start still works.
    send(&mut host, &start_game_event("geo")).await;
    recv_until(&mut host, |ev| {
        matches!(ev, ServerEvent::QuestionStarted { .. }).then_some(())
    })
    .await;
}

#[tokio::test]
async fn test_duplicate_answer_yields_invalid_answer() {
    let (addr, _registry) = start_server().await;
    let mut host = connect(&addr).await;
    let _code = create_room(&mut host, "h1", "Host").await;

    let mut p1 = connect(&addr).await;
    send(&mut p1, &join_room_event(&_code, "p1", "Ada")).await;
    recv_until(&mut p1, |ev| matches!(ev, ServerEvent::RoomState { .. }).then_some(())).await;

    send(&mut host, &start_game_event("geo")).await;
    recv_until(&mut host, |ev| {
        matches!(ev, ServerEvent::QuestionStarted { .. }).then_some(())
    })
    .await;

    send(&mut host, &answer_event(0, 0)).await;
    send(&mut host, &answer_event(0, 2)).await;

    match recv_event(&mut host).await {
        ServerEvent::Error { kind, .. } => assert_eq!(kind, ErrorKind::InvalidAnswer),
        other => panic!("expected error, got {other:?}"),
    }
}

// =========================================================================
// Reconnection
// =========================================================================

#[tokio::test]
async fn test_reconnect_on_new_socket_preserves_identity() {
    let (addr, _registry) = start_server().await;
    let mut host = connect(&addr).await;
    let code = create_room(&mut host, "h1", "Host").await;

    let mut p1 = connect(&addr).await;
    send(&mut p1, &join_room_event(&code, "p1", "Ada")).await;
    recv_until(&mut p1, |ev| matches!(ev, ServerEvent::RoomState { .. }).then_some(())).await;

    send(&mut host, &start_game_event("geo")).await;
    recv_until(&mut p1, |ev| {
        matches!(ev, ServerEvent::QuestionStarted { .. }).then_some(())
    })
    .await;

    // Both answer question 0 correctly; Ada banks some points.
    send(&mut host, &answer_event(0, 0)).await;
    send(&mut p1, &answer_event(0, 0)).await;
    recv_until(&mut p1, |ev| {
        matches!(ev, ServerEvent::AnswerResult { .. }).then_some(())
    })
    .await;

    // Ada's socket drops mid-game.
    p1.close(None).await.expect("close");
    drop(p1);

    // Back within the grace period, same token, new socket.
    let mut revenant = connect(&addr).await;
    send(&mut revenant, &join_room_event(&code, "p1", "Ada")).await;

    let players = recv_until(&mut revenant, |ev| match ev {
        ServerEvent::RoomState { players, .. } => Some(players),
        _ => None,
    })
    .await;
    assert_eq!(players.len(), 2, "no duplicate identity ghosts");
    let ada = players.iter().find(|p| p.name == "Ada").expect("Ada is back");
    assert!(ada.connected);
    assert!(ada.score > 0, "score must survive the reconnect");
}

// =========================================================================
// Global stats
// =========================================================================

#[tokio::test]
async fn test_global_stats_over_two_rooms() {
    let (addr, registry) = start_server().await;

    // Room A: host + 2 players. Wait for each join's roster broadcast so
    // the counts below can't race the attachments.
    let mut a_host = connect(&addr).await;
    let code_a = create_room(&mut a_host, "ha", "HostA").await;
    let mut a1 = connect(&addr).await;
    send(&mut a1, &join_room_event(&code_a, "a1", "Ada")).await;
    recv_until(&mut a1, |ev| matches!(ev, ServerEvent::RoomState { .. }).then_some(())).await;
    let mut a2 = connect(&addr).await;
    send(&mut a2, &join_room_event(&code_a, "a2", "Grace")).await;
    recv_until(&mut a2, |ev| {
        matches!(ev, ServerEvent::RoomState { ref players, .. } if players.len() == 3)
            .then_some(())
    })
    .await;

    // Room B: host + 1 player.
    let mut b_host = connect(&addr).await;
    let code_b = create_room(&mut b_host, "hb", "HostB").await;
    let mut b1 = connect(&addr).await;
    send(&mut b1, &join_room_event(&code_b, "b1", "Edsger")).await;
    recv_until(&mut b1, |ev| {
        matches!(ev, ServerEvent::RoomState { ref players, .. } if players.len() == 2)
            .then_some(())
    })
    .await;

    let stats = registry.global_stats();
    assert_eq!(stats.online_users, 5);
    assert_eq!(stats.active_rooms, 2);
}
