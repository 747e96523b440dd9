//! Room registry: the process-wide table of active rooms.
//!
//! The single authoritative source of room existence and code uniqueness.
//! Initialized empty at process start, torn down with the process; every
//! access goes through its methods — nothing else holds the table.
//!
//! The registry and its two global counters are the only mutable state
//! shared across rooms. The table is a sharded concurrent map and the
//! counters are atomics, so no registry operation ever spans a room's
//! processing — reserving a code or bumping a counter is the whole
//! critical section.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use trivium_protocol::{PlayerToken, RoomCode};
use trivium_session::EventSink;
use trivium_transport::ConnectionId;

use crate::room::spawn_room;
use crate::{RegistryConfig, RoomConfig, RoomError, RoomHandle, code};

// ---------------------------------------------------------------------------
// Global stats
// ---------------------------------------------------------------------------

/// Running counters maintained incrementally by room actors, so the stats
/// query is O(1) regardless of room count.
#[derive(Debug, Default)]
pub(crate) struct RegistryStats {
    online_users: AtomicUsize,
    active_rooms: AtomicUsize,
}

impl RegistryStats {
    pub(crate) fn player_online(&self) {
        self.online_users.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn player_offline(&self) {
        self.online_users.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn room_opened(&self) {
        self.active_rooms.fetch_add(1, Ordering::Relaxed);
    }

    /// Called once per room, on entering `GAME_OVER` or on shutdown,
    /// whichever comes first.
    pub(crate) fn room_closed(&self) {
        self.active_rooms.fetch_sub(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> GlobalStats {
        GlobalStats {
            online_users: self.online_users.load(Ordering::Relaxed),
            active_rooms: self.active_rooms.load(Ordering::Relaxed),
        }
    }
}

/// The platform-wide numbers shown on the landing page.
///
/// `online_users` counts connected players across all rooms;
/// `active_rooms` counts rooms that have not reached `GAME_OVER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlobalStats {
    pub online_users: usize,
    pub active_rooms: usize,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Process-wide table mapping room codes to running room actors.
pub struct RoomRegistry {
    rooms: DashMap<RoomCode, RoomHandle>,
    stats: Arc<RegistryStats>,
    registry_config: RegistryConfig,
    room_config: RoomConfig,
}

impl RoomRegistry {
    /// Creates an empty registry.
    ///
    /// Returned in an `Arc` because every room actor keeps a reference for
    /// terminal deregistration.
    pub fn new(registry_config: RegistryConfig, room_config: RoomConfig) -> Arc<Self> {
        Arc::new(Self {
            rooms: DashMap::new(),
            stats: Arc::new(RegistryStats::default()),
            registry_config,
            room_config,
        })
    }

    /// Creates a room with a fresh unique code and the caller as host and
    /// first player.
    ///
    /// Codes are drawn until one is unused; with the code space vastly
    /// larger than the room cap this is expected to take one draw.
    pub async fn create_room(
        self: &Arc<Self>,
        conn: ConnectionId,
        sink: EventSink,
        host_token: PlayerToken,
        host_name: String,
        host_avatar: Option<String>,
    ) -> Result<(RoomCode, RoomHandle), RoomError> {
        if self.rooms.len() >= self.registry_config.max_rooms {
            return Err(RoomError::CapacityExceeded {
                limit: self.registry_config.max_rooms,
            });
        }

        let handle = loop {
            let candidate = code::generate_code();
            match self.rooms.entry(candidate.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let handle = spawn_room(
                        candidate,
                        host_token.clone(),
                        self.room_config.clone(),
                        self.registry_config.command_buffer,
                        Arc::clone(self),
                        Arc::clone(&self.stats),
                    );
                    slot.insert(handle.clone());
                    break handle;
                }
            }
        };

        let code = handle.code().clone();
        tracing::info!(room = %code, host = %host_token, "room created");

        if let Err(e) = handle
            .join(conn, sink, host_token, host_name, host_avatar)
            .await
        {
            self.rooms.remove(&code);
            return Err(e);
        }

        Ok((code, handle))
    }

    /// Looks up a room by code.
    pub fn find(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.get(code).map(|entry| entry.value().clone())
    }

    /// Deregisters a room. Called by the room actor on terminal cleanup —
    /// nothing else removes entries.
    pub(crate) fn remove(&self, code: &RoomCode) {
        self.rooms.remove(code);
    }

    /// The current platform-wide counters. O(1).
    pub fn global_stats(&self) -> GlobalStats {
        self.stats.snapshot()
    }

    /// Number of registered rooms (including finished ones not yet
    /// evicted).
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
