//! Per-connection handler: decode events, route them, pump broadcasts.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The lifecycle:
//!
//!   1. Unbound: only `create_room` / `join_room` are accepted
//!   2. Bound: commands are routed to the owning room; the room's
//!      broadcasts are pumped out over the socket
//!   3. `leave_room` unbinds (back to 1); a transport drop while bound
//!      reports a disconnect to the room exactly once — the start of the
//!      reconnection grace period
//!
//! Per-request failures become `error` events on this connection only.
//! The content fetch for `start_game` happens here, before the room's
//! serialized section, so room actors never await mid-state.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use trivium_content::ContentSource;
use trivium_protocol::{
    ClientEvent, Codec, ErrorKind, PlayerToken, ServerEvent,
};
use trivium_room::{RoomError, RoomHandle};
use trivium_transport::{Connection, WsConnection};

use crate::TriviumError;
use crate::server::ServerState;

/// The connection's membership in a room, while bound.
struct Binding {
    handle: RoomHandle,
    token: PlayerToken,
    /// Broadcasts from the room destined for this connection.
    outbound: UnboundedReceiver<ServerEvent>,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: ContentSource>(
    conn: WsConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), TriviumError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut binding: Option<Binding> = None;
    let result = drive(&conn, &state, &mut binding).await;

    // Transport drop (or handler failure) while bound: the grace-period
    // path, reported to the room exactly once.
    if let Some(b) = binding.take() {
        b.handle.disconnect(conn_id).await;
    }

    result
}

/// One iteration's wakeup source.
enum Step {
    Inbound(Option<Vec<u8>>),
    Outbound(Option<ServerEvent>),
}

async fn drive<C: ContentSource>(
    conn: &WsConnection,
    state: &Arc<ServerState<C>>,
    binding: &mut Option<Binding>,
) -> Result<(), TriviumError> {
    loop {
        let step = match binding.as_mut() {
            Some(bound) => tokio::select! {
                frame = conn.recv() => Step::Inbound(frame?),
                ev = bound.outbound.recv() => Step::Outbound(ev),
            },
            None => Step::Inbound(conn.recv().await?),
        };

        match step {
            Step::Inbound(None) => {
                tracing::debug!(conn = %conn.id(), "connection closed");
                return Ok(());
            }
            Step::Inbound(Some(frame)) => {
                let event: ClientEvent = match state.codec.decode(&frame) {
                    Ok(ev) => ev,
                    Err(e) => {
                        tracing::debug!(conn = %conn.id(), error = %e, "undecodable event");
                        send_error(
                            conn,
                            state,
                            ErrorKind::Malformed,
                            "could not decode event",
                        )
                        .await?;
                        continue;
                    }
                };
                handle_event(conn, state, binding, event).await?;
            }
            Step::Outbound(Some(event)) => {
                send_event(conn, state, &event).await?;
            }
            Step::Outbound(None) => {
                // The room dropped this connection's sink: the room was
                // dismissed/evicted or this player was removed. The
                // connection lives on, free to create or join again.
                tracing::debug!(conn = %conn.id(), "room released this connection");
                *binding = None;
            }
        }
    }
}

async fn handle_event<C: ContentSource>(
    conn: &WsConnection,
    state: &Arc<ServerState<C>>,
    binding: &mut Option<Binding>,
    event: ClientEvent,
) -> Result<(), TriviumError> {
    match event {
        ClientEvent::CreateRoom {
            player_token,
            player_name,
            player_avatar,
        } => {
            if binding.is_some() {
                return send_error(
                    conn,
                    state,
                    ErrorKind::InvalidTransition,
                    "already in a room",
                )
                .await;
            }

            let (tx, rx) = mpsc::unbounded_channel();
            match state
                .registry
                .create_room(conn.id(), tx, player_token.clone(), player_name, player_avatar)
                .await
            {
                Ok((code, handle)) => {
                    send_event(conn, state, &ServerEvent::RoomCreated { code }).await?;
                    *binding = Some(Binding {
                        handle,
                        token: player_token,
                        outbound: rx,
                    });
                }
                Err(e) => send_room_error(conn, state, &e).await?,
            }
        }

        ClientEvent::JoinRoom {
            code,
            player_token,
            player_name,
            player_avatar,
        } => {
            if binding.is_some() {
                return send_error(
                    conn,
                    state,
                    ErrorKind::InvalidTransition,
                    "already in a room",
                )
                .await;
            }

            let Some(handle) = state.registry.find(&code) else {
                return send_error(
                    conn,
                    state,
                    ErrorKind::RoomNotFound,
                    &format!("no room with code {code}"),
                )
                .await;
            };

            let (tx, rx) = mpsc::unbounded_channel();
            match handle
                .join(conn.id(), tx, player_token.clone(), player_name, player_avatar)
                .await
            {
                Ok(()) => {
                    *binding = Some(Binding {
                        handle,
                        token: player_token,
                        outbound: rx,
                    });
                }
                Err(e) => send_room_error(conn, state, &e).await?,
            }
        }

        ClientEvent::StartGame {
            collection_id,
            options,
        } => {
            let Some((handle, token)) = bound(binding) else {
                return send_error(conn, state, ErrorKind::InvalidTransition, "not in a room")
                    .await;
            };

            // Fetch before the room's serialized section; failures stay
            // on this (the host's) connection and the room stays in its
            // lobby untouched.
            let questions = match state.content.load_questions(&collection_id).await {
                Ok(questions) => questions,
                Err(e) => {
                    tracing::debug!(conn = %conn.id(), error = %e, "content fetch failed");
                    return send_error(conn, state, e.kind(), &e.to_string()).await;
                }
            };

            let result = handle.start(token, questions, options).await;
            finish_room_command(conn, state, binding, result).await?;
        }

        ClientEvent::SubmitAnswer {
            question_index,
            choice_index,
        } => {
            let Some((handle, token)) = bound(binding) else {
                return send_error(conn, state, ErrorKind::InvalidTransition, "not in a room")
                    .await;
            };
            let result = handle.submit_answer(token, question_index, choice_index).await;
            finish_room_command(conn, state, binding, result).await?;
        }

        ClientEvent::SkipQuestion => {
            let Some((handle, token)) = bound(binding) else {
                return send_error(conn, state, ErrorKind::InvalidTransition, "not in a room")
                    .await;
            };
            let result = handle.skip_question(token).await;
            finish_room_command(conn, state, binding, result).await?;
        }

        ClientEvent::EndGame => {
            let Some((handle, token)) = bound(binding) else {
                return send_error(conn, state, ErrorKind::InvalidTransition, "not in a room")
                    .await;
            };
            let result = handle.end_game(token).await;
            finish_room_command(conn, state, binding, result).await?;
        }

        ClientEvent::LeaveRoom => match binding.take() {
            Some(b) => {
                if let Err(e) = b.handle.leave(b.token).await {
                    send_room_error(conn, state, &e).await?;
                }
            }
            None => {
                send_error(conn, state, ErrorKind::InvalidTransition, "not in a room").await?;
            }
        },
    }

    Ok(())
}

/// The current room binding as cheap clones, if bound.
fn bound(binding: &Option<Binding>) -> Option<(RoomHandle, PlayerToken)> {
    binding
        .as_ref()
        .map(|b| (b.handle.clone(), b.token.clone()))
}

/// Reports a room command failure to this connection; a vanished room
/// additionally releases the binding so the client can join elsewhere.
async fn finish_room_command<C: ContentSource>(
    conn: &WsConnection,
    state: &Arc<ServerState<C>>,
    binding: &mut Option<Binding>,
    result: Result<(), RoomError>,
) -> Result<(), TriviumError> {
    if let Err(e) = result {
        if matches!(e, RoomError::Unavailable(_)) {
            *binding = None;
        }
        send_room_error(conn, state, &e).await?;
    }
    Ok(())
}

async fn send_room_error<C: ContentSource>(
    conn: &WsConnection,
    state: &Arc<ServerState<C>>,
    error: &RoomError,
) -> Result<(), TriviumError> {
    send_error(conn, state, error.kind(), &error.to_string()).await
}

async fn send_error<C: ContentSource>(
    conn: &WsConnection,
    state: &Arc<ServerState<C>>,
    kind: ErrorKind,
    message: &str,
) -> Result<(), TriviumError> {
    send_event(
        conn,
        state,
        &ServerEvent::Error {
            kind,
            message: message.to_string(),
        },
    )
    .await
}

async fn send_event<C: ContentSource>(
    conn: &WsConnection,
    state: &Arc<ServerState<C>>,
    event: &ServerEvent,
) -> Result<(), TriviumError> {
    let bytes = state.codec.encode(event)?;
    conn.send(&bytes).await?;
    Ok(())
}
