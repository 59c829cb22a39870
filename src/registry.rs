//! Live connections per game room and their roles.
//!
//! Every room sits behind its own mutex, so joins and moves in one room never
//! wait on another room. All role assignment and turn checking for a room
//! happens inside `SessionRegistry::with_room`, which holds that room's lock
//! for the whole closure.

use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::{ConnectionId, GameId, Role, ServerMessage};
use crate::websocket::sink::ClientSink;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A connection that has joined a room
pub struct Member {
    pub username: String,
    pub role: Role,
    sink: Arc<dyn ClientSink>,
}

/// The connections currently viewing one game
pub struct Room {
    game_id: GameId,
    members: HashMap<ConnectionId, Member>,
    // set once the room has been dropped from the registry
    retired: bool,
}

impl Room {
    fn new(game_id: GameId) -> Self {
        Self {
            game_id,
            members: HashMap::new(),
            retired: false,
        }
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, conn: ConnectionId) -> Option<&Member> {
        self.members.get(&conn)
    }

    /// WHITE if free, else BLACK if free, else SPECTATOR
    pub fn first_available_role(&self) -> Role {
        let taken = |role: Role| self.members.values().any(|m| m.role == role);
        if !taken(Role::White) {
            Role::White
        } else if !taken(Role::Black) {
            Role::Black
        } else {
            Role::Spectator
        }
    }

    /// Adds `conn` with the first available role. A connection already in the
    /// room is re-added as a fresh join.
    pub fn join(
        &mut self,
        conn: ConnectionId,
        username: String,
        sink: Arc<dyn ClientSink>,
    ) -> Role {
        self.members.remove(&conn);
        let role = self.first_available_role();
        self.members.insert(
            conn,
            Member {
                username,
                role,
                sink,
            },
        );
        role
    }

    pub fn remove(&mut self, conn: ConnectionId) -> Option<Member> {
        self.members.remove(&conn)
    }

    pub fn send_to(&self, conn: ConnectionId, message: &ServerMessage) {
        if let Some(member) = self.members.get(&conn) {
            deliver(self.game_id, conn, member, message);
        }
    }

    /// Best-effort delivery to every member; failures are logged and skipped
    pub fn broadcast(&self, message: &ServerMessage) {
        for (conn, member) in &self.members {
            deliver(self.game_id, *conn, member, message);
        }
    }

    pub fn broadcast_except(&self, excluded: ConnectionId, message: &ServerMessage) {
        for (conn, member) in self.members.iter().filter(|(conn, _)| **conn != excluded) {
            deliver(self.game_id, *conn, member, message);
        }
    }
}

fn deliver(game_id: GameId, conn: ConnectionId, member: &Member, message: &ServerMessage) {
    if let Err(err) = member.sink.send(message) {
        warn!(
            "Failed to deliver message to {} ({}) in game {}: {}",
            member.username, conn, game_id, err
        );
    }
}

/// Registry of all rooms and of which room each connection is bound to
#[derive(Default)]
pub struct SessionRegistry {
    rooms: Mutex<HashMap<GameId, Arc<Mutex<Room>>>>,
    bindings: Mutex<HashMap<ConnectionId, GameId>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with exclusive access to the room for `game_id`.
    ///
    /// The room is created on first use and dropped from the registry when `f`
    /// leaves it empty. A caller that raced with such a drop retries on a
    /// fresh room instead of mutating the dropped one.
    pub fn with_room<R>(&self, game_id: GameId, f: impl FnOnce(&mut Room) -> R) -> R {
        loop {
            let room = {
                let mut rooms = lock(&self.rooms);
                Arc::clone(
                    rooms
                        .entry(game_id)
                        .or_insert_with(|| Arc::new(Mutex::new(Room::new(game_id)))),
                )
            };

            let mut guard = lock(&room);
            if guard.retired {
                continue;
            }
            let out = f(&mut guard);

            if guard.is_empty() {
                guard.retired = true;
                let mut rooms = lock(&self.rooms);
                if rooms.get(&game_id).is_some_and(|r| Arc::ptr_eq(r, &room)) {
                    rooms.remove(&game_id);
                    debug!("Retired empty room for game {}", game_id);
                }
            }
            return out;
        }
    }

    /// Game the connection is currently joined to
    pub fn bound_game(&self, conn: ConnectionId) -> Option<GameId> {
        lock(&self.bindings).get(&conn).copied()
    }

    pub fn bind(&self, conn: ConnectionId, game_id: GameId) {
        lock(&self.bindings).insert(conn, game_id);
    }

    /// Drops the binding only if it still points at `game_id`
    pub fn unbind(&self, conn: ConnectionId, game_id: GameId) {
        let mut bindings = lock(&self.bindings);
        if bindings.get(&conn) == Some(&game_id) {
            bindings.remove(&conn);
        }
    }

    pub fn room_count(&self) -> usize {
        lock(&self.rooms).len()
    }

    pub fn connection_count(&self) -> usize {
        lock(&self.bindings).len()
    }
}
