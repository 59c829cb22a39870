use actix::Recipient;

use crate::models::{ChessWebSocketMessage, ServerMessage};

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("could not encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("connection is closed")]
    Closed,
}

/// Outbound half of one client connection
pub trait ClientSink: Send + Sync {
    fn send(&self, message: &ServerMessage) -> Result<(), SendError>;
}

/// Delivers JSON text frames through a WebSocket actor's mailbox. The
/// mailbox capacity does not apply; only a stopped actor refuses a frame.
pub struct ActorSink {
    recipient: Recipient<ChessWebSocketMessage>,
}

impl ActorSink {
    pub fn new(recipient: Recipient<ChessWebSocketMessage>) -> Self {
        Self { recipient }
    }
}

impl ClientSink for ActorSink {
    fn send(&self, message: &ServerMessage) -> Result<(), SendError> {
        let text = serde_json::to_string(message)?;
        if !self.recipient.connected() {
            return Err(SendError::Closed);
        }
        self.recipient.do_send(ChessWebSocketMessage(text));
        Ok(())
    }
}
