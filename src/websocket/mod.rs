pub mod game_handlers;
pub mod handler;
pub mod sink;

pub use game_handlers::GameSync;
pub use handler::{ws_index, ChessWebSocket};
pub use sink::{ActorSink, ClientSink, SendError};
