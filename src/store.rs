//! Game storage collaborator.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::game::Game;
use crate::models::GameId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("game {0} not found")]
    NotFound(GameId),

    #[error("storage failure: {0}")]
    Failure(String),
}

/// Durable home of the authoritative game records
pub trait GameStore: Send + Sync {
    fn load_game(&self, game_id: GameId) -> Result<Game, StoreError>;

    fn save_game(&self, game_id: GameId, game: &Game) -> Result<(), StoreError>;
}

/// Process-local store backed by a map
#[derive(Default)]
pub struct MemoryGameStore {
    games: Mutex<HashMap<GameId, Game>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a game in the starting position; an existing game is left alone
    pub fn create_game(&self, game_id: GameId) {
        self.games().entry(game_id).or_insert_with(Game::new);
    }

    pub fn insert(&self, game_id: GameId, game: Game) {
        self.games().insert(game_id, game);
    }

    fn games(&self) -> MutexGuard<'_, HashMap<GameId, Game>> {
        self.games.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GameStore for MemoryGameStore {
    fn load_game(&self, game_id: GameId) -> Result<Game, StoreError> {
        self.games()
            .get(&game_id)
            .cloned()
            .ok_or(StoreError::NotFound(game_id))
    }

    fn save_game(&self, game_id: GameId, game: &Game) -> Result<(), StoreError> {
        match self.games().get_mut(&game_id) {
            Some(slot) => {
                *slot = game.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(game_id)),
        }
    }
}
