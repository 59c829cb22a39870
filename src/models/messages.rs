use actix::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SyncError;
use crate::game::{Board, Color, Game, GameStatus, Move};
use crate::models::GameId;

const CLIENT_MESSAGE_TYPES: [&str; 4] = ["connect", "make_move", "leave", "resign"];

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum ClientMessage {
    Connect {
        game_id: GameId,
        auth_token: String,
    },
    MakeMove {
        game_id: GameId,
        auth_token: String,
        #[serde(rename = "move")]
        chess_move: Move,
    },
    Leave {
        game_id: GameId,
        auth_token: String,
    },
    Resign {
        game_id: GameId,
        auth_token: String,
    },
}

impl ClientMessage {
    /// Decodes one text frame, telling unknown kinds apart from malformed payloads.
    pub fn parse(text: &str) -> Result<Self, SyncError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| SyncError::MalformedMessage(e.to_string()))?;
        let kind = value
            .get("message_type")
            .and_then(Value::as_str)
            .ok_or_else(|| SyncError::MalformedMessage("missing message_type".to_string()))?;
        if !CLIENT_MESSAGE_TYPES.contains(&kind) {
            return Err(SyncError::UnknownEventKind(kind.to_string()));
        }
        serde_json::from_value(value).map_err(|e| SyncError::MalformedMessage(e.to_string()))
    }

    pub fn game_id(&self) -> GameId {
        match self {
            ClientMessage::Connect { game_id, .. }
            | ClientMessage::MakeMove { game_id, .. }
            | ClientMessage::Leave { game_id, .. }
            | ClientMessage::Resign { game_id, .. } => *game_id,
        }
    }
}

/// Full view of a game as sent to clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub game_id: GameId,
    pub board: Board,
    pub side_to_move: Color,
    pub status: GameStatus,
}

impl GameSnapshot {
    pub fn of(game_id: GameId, game: &Game) -> Self {
        Self {
            game_id,
            board: game.board().clone(),
            side_to_move: game.side_to_move(),
            status: game.status(),
        }
    }
}

/// Message sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum ServerMessage {
    StateSnapshot { game: GameSnapshot },
    Notification { message: String },
    Error { error_message: String },
}

impl ServerMessage {
    pub fn snapshot(game_id: GameId, game: &Game) -> Self {
        ServerMessage::StateSnapshot {
            game: GameSnapshot::of(game_id, game),
        }
    }

    pub fn notification(message: impl Into<String>) -> Self {
        ServerMessage::Notification {
            message: message.into(),
        }
    }

    pub fn error(err: &SyncError) -> Self {
        ServerMessage::Error {
            error_message: err.to_string(),
        }
    }
}

/// Message type for WebSocket communication
#[derive(Message)]
#[rtype(result = "()")]
pub struct ChessWebSocketMessage(pub String);
