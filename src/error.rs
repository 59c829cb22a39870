use crate::game::MoveError;
use crate::models::GameId;
use crate::store::StoreError;

/// Errors reported back to the connection that triggered them.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("illegal move: {0}")]
    IllegalMove(#[from] MoveError),

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("spectators cannot make moves")]
    SpectatorsCannotMove,

    #[error("spectators cannot resign")]
    SpectatorsCannotResign,

    #[error("not a participant of game {0}")]
    NotAJoinedParticipant(GameId),

    #[error("game {0} does not exist")]
    GameNotFound(GameId),

    #[error("invalid auth token")]
    InvalidIdentity,

    #[error("unknown message type: {0}")]
    UnknownEventKind(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("game {0} is already over")]
    GameOver(GameId),

    #[error("storage error: {0}")]
    Storage(#[source] StoreError),
}

impl SyncError {
    /// Maps a storage error raised while loading `game_id`
    pub fn from_load(game_id: GameId, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => SyncError::GameNotFound(game_id),
            other => SyncError::Storage(other),
        }
    }
}
