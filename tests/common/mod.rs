#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chess_sync_server::game::{Game, Move, Position};
use chess_sync_server::identity::MemoryIdentity;
use chess_sync_server::models::{ConnectionId, GameId, Role, ServerMessage};
use chess_sync_server::registry::SessionRegistry;
use chess_sync_server::store::{GameStore, MemoryGameStore, StoreError};
use chess_sync_server::websocket::{ClientSink, GameSync, SendError};
use chess_sync_server::SyncError;

/// Sink that keeps every message it is given
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<ServerMessage>>,
    closed: AtomicBool,
}

impl RecordingSink {
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<ServerMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }

    pub fn notifications(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                ServerMessage::Notification { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                ServerMessage::Error { error_message } => Some(error_message),
                _ => None,
            })
            .collect()
    }

    pub fn snapshot_count(&self) -> usize {
        self.messages()
            .iter()
            .filter(|m| matches!(m, ServerMessage::StateSnapshot { .. }))
            .count()
    }
}

impl ClientSink for RecordingSink {
    fn send(&self, message: &ServerMessage) -> Result<(), SendError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SendError::Closed);
        }
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Memory store whose saves can be switched to fail
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryGameStore,
    pub fail_saves: AtomicBool,
}

impl GameStore for FlakyStore {
    fn load_game(&self, game_id: GameId) -> Result<Game, StoreError> {
        self.inner.load_game(game_id)
    }

    fn save_game(&self, game_id: GameId, game: &Game) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Failure("disk full".to_string()));
        }
        self.inner.save_game(game_id, game)
    }
}

/// One client connection as seen by the tests
pub struct Client {
    pub conn: ConnectionId,
    pub token: String,
    pub sink: Arc<RecordingSink>,
}

impl Client {
    pub fn dyn_sink(&self) -> Arc<dyn ClientSink> {
        self.sink.clone()
    }
}

pub struct Harness {
    pub sync: GameSync,
    pub store: Arc<FlakyStore>,
    pub identity: Arc<MemoryIdentity>,
}

impl Harness {
    /// Server with the given games in their starting position
    pub fn with_games(games: &[u32]) -> Self {
        let store = Arc::new(FlakyStore::default());
        for id in games {
            store.inner.create_game(GameId(*id));
        }
        let identity = Arc::new(MemoryIdentity::new());
        let sync = GameSync::new(
            Arc::new(SessionRegistry::new()),
            store.clone(),
            identity.clone(),
        );
        Self {
            sync,
            store,
            identity,
        }
    }

    pub fn client(&self, username: &str) -> Client {
        let token = format!("{username}-token");
        self.identity.register(token.clone(), username);
        Client {
            conn: ConnectionId::new(),
            token,
            sink: Arc::new(RecordingSink::default()),
        }
    }

    pub fn connect(&self, client: &Client, game: u32) -> Result<Role, SyncError> {
        self.sync
            .handle_connect(client.conn, client.dyn_sink(), GameId(game), &client.token)
    }

    pub fn play(&self, client: &Client, game: u32, from: &str, to: &str) -> Result<(), SyncError> {
        self.sync
            .handle_move(client.conn, GameId(game), &client.token, mv(from, to))
    }

    pub fn game(&self, game: u32) -> Game {
        self.store.inner.load_game(GameId(game)).unwrap()
    }
}

pub fn sq(s: &str) -> Position {
    s.parse().unwrap()
}

pub fn mv(from: &str, to: &str) -> Move {
    Move::new(sq(from), sq(to))
}
