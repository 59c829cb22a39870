use log::{info, warn};
use std::sync::Arc;

use crate::error::SyncError;
use crate::game::utils::{check_notice, describe_move, terminal_notice};
use crate::game::{GameStatus, Move};
use crate::identity::IdentityProvider;
use crate::models::{ClientMessage, ConnectionId, GameId, Role, ServerMessage};
use crate::registry::{Room, SessionRegistry};
use crate::store::GameStore;
use crate::websocket::sink::ClientSink;

/// Turns inbound room events into state changes and broadcasts.
///
/// Each operation runs under the room lock from `SessionRegistry::with_room`,
/// so role assignment and the turn check plus apply never interleave with
/// another event for the same game.
pub struct GameSync {
    registry: Arc<SessionRegistry>,
    store: Arc<dyn GameStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl GameSync {
    pub fn new(
        registry: Arc<SessionRegistry>,
        store: Arc<dyn GameStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            registry,
            store,
            identity,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Handles one decoded client message; any failure goes back to `sink` only.
    pub fn dispatch(&self, conn: ConnectionId, sink: &Arc<dyn ClientSink>, msg: ClientMessage) {
        let result = match msg {
            ClientMessage::Connect {
                game_id,
                auth_token,
            } => self
                .handle_connect(conn, Arc::clone(sink), game_id, &auth_token)
                .map(|_| ()),
            ClientMessage::MakeMove {
                game_id,
                auth_token,
                chess_move,
            } => self.handle_move(conn, game_id, &auth_token, chess_move),
            ClientMessage::Leave {
                game_id,
                auth_token,
            } => self.handle_leave(conn, game_id, &auth_token),
            ClientMessage::Resign {
                game_id,
                auth_token,
            } => self.handle_resign(conn, game_id, &auth_token),
        };

        if let Err(err) = result {
            self.report(conn, sink.as_ref(), &err);
        }
    }

    /// Sends `err` to the originating connection
    pub fn report(&self, conn: ConnectionId, sink: &dyn ClientSink, err: &SyncError) {
        warn!("Rejected request from {}: {}", conn, err);
        if let Err(send_err) = sink.send(&ServerMessage::error(err)) {
            warn!("Could not report error to {}: {}", conn, send_err);
        }
    }

    fn resolve(&self, auth_token: &str) -> Result<String, SyncError> {
        self.identity
            .resolve(auth_token)
            .ok_or(SyncError::InvalidIdentity)
    }

    pub fn handle_connect(
        &self,
        conn: ConnectionId,
        sink: Arc<dyn ClientSink>,
        game_id: GameId,
        auth_token: &str,
    ) -> Result<Role, SyncError> {
        let username = self.resolve(auth_token)?;
        self.store
            .load_game(game_id)
            .map_err(|e| SyncError::from_load(game_id, e))?;

        if let Some(previous) = self.registry.bound_game(conn) {
            info!("{} is switching from game {} to game {}", username, previous, game_id);
            self.depart(conn, previous);
        }

        self.registry.with_room(game_id, |room| -> Result<Role, SyncError> {
            let game = self
                .store
                .load_game(game_id)
                .map_err(|e| SyncError::from_load(game_id, e))?;

            let role = room.join(conn, username.clone(), sink);
            self.registry.bind(conn, game_id);
            info!("{} ({}) joined game {} as {}", username, conn, game_id, role);

            room.send_to(conn, &ServerMessage::snapshot(game_id, &game));
            room.send_to(
                conn,
                &ServerMessage::notification(format!("You joined game {} as {}", game_id, role)),
            );
            room.broadcast_except(
                conn,
                &ServerMessage::notification(format!("{} joined as {}", username, role)),
            );
            Ok(role)
        })
    }

    pub fn handle_move(
        &self,
        conn: ConnectionId,
        game_id: GameId,
        auth_token: &str,
        mv: Move,
    ) -> Result<(), SyncError> {
        let username = self.resolve(auth_token)?;

        self.registry.with_room(game_id, |room| -> Result<(), SyncError> {
            let color = participant(room, conn, &username)?
                .color()
                .ok_or(SyncError::SpectatorsCannotMove)?;

            let mut game = self
                .store
                .load_game(game_id)
                .map_err(|e| SyncError::from_load(game_id, e))?;
            if game.is_over() {
                return Err(SyncError::GameOver(game_id));
            }
            if game.side_to_move() != color {
                return Err(SyncError::NotYourTurn);
            }

            game.apply_move(mv)?;
            self.store
                .save_game(game_id, &game)
                .map_err(SyncError::Storage)?;
            info!("{} played {} in game {}", username, mv, game_id);

            room.broadcast(&ServerMessage::snapshot(game_id, &game));
            let moved = ServerMessage::notification(describe_move(&username, &mv));
            room.broadcast_except(conn, &moved);

            if let Some(notice) = terminal_notice(&game) {
                info!("Game {} is over: {}", game_id, notice);
                room.broadcast(&ServerMessage::notification(notice));
            } else if game.status() == GameStatus::Check {
                room.broadcast(&ServerMessage::notification(check_notice(game.side_to_move())));
            }
            Ok(())
        })
    }

    /// Leaving a room the connection is not in is a no-op
    pub fn handle_leave(
        &self,
        conn: ConnectionId,
        game_id: GameId,
        auth_token: &str,
    ) -> Result<(), SyncError> {
        self.resolve(auth_token)?;
        self.depart(conn, game_id);
        Ok(())
    }

    pub fn handle_resign(
        &self,
        conn: ConnectionId,
        game_id: GameId,
        auth_token: &str,
    ) -> Result<(), SyncError> {
        let username = self.resolve(auth_token)?;

        self.registry.with_room(game_id, |room| -> Result<(), SyncError> {
            let color = participant(room, conn, &username)?
                .color()
                .ok_or(SyncError::SpectatorsCannotResign)?;

            let mut game = self
                .store
                .load_game(game_id)
                .map_err(|e| SyncError::from_load(game_id, e))?;
            game.resign(color)
                .map_err(|_| SyncError::GameOver(game_id))?;
            self.store
                .save_game(game_id, &game)
                .map_err(SyncError::Storage)?;
            info!("{} resigned game {} as {}", username, game_id, color);

            room.broadcast(&ServerMessage::snapshot(game_id, &game));
            if let Some(notice) = terminal_notice(&game) {
                room.broadcast(&ServerMessage::notification(notice));
            }
            Ok(())
        })
    }

    /// Cleanup for a closed transport; safe to call more than once
    pub fn handle_disconnect(&self, conn: ConnectionId) {
        if let Some(game_id) = self.registry.bound_game(conn) {
            self.depart(conn, game_id);
        }
    }

    fn depart(&self, conn: ConnectionId, game_id: GameId) {
        self.registry.with_room(game_id, |room| {
            let Some(member) = room.remove(conn) else {
                return;
            };
            self.registry.unbind(conn, game_id);
            info!("{} ({}) left game {}", member.username, conn, game_id);
            room.broadcast(&ServerMessage::notification(format!(
                "{} left the game",
                member.username
            )));
        });
    }
}

// The role of `conn` in `room`, provided it joined under the same identity.
fn participant(room: &Room, conn: ConnectionId, username: &str) -> Result<Role, SyncError> {
    match room.member(conn) {
        Some(member) if member.username == username => Ok(member.role),
        _ => Err(SyncError::NotAJoinedParticipant(room.game_id())),
    }
}
