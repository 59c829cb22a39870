//! Rules engine: board, move generation, legality and game status.

pub mod board;
pub mod game_state;
pub mod movegen;
pub mod piece;
pub mod utils;

pub use board::{Board, Position};
pub use game_state::{Game, GameStatus, MoveError};
pub use movegen::piece_moves;
pub use piece::{Color, Move, Movement, Piece, PieceType};
