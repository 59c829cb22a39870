use serde::{Deserialize, Serialize};

use crate::game::board::{Board, Position};
use crate::game::movegen::piece_moves;
use crate::game::piece::{Color, Move, Piece};

/// Status of a game from the point of view of the side to move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    InProgress,
    Check,
    Checkmate,
    Stalemate,
    Resigned,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GameStatus::Checkmate | GameStatus::Stalemate | GameStatus::Resigned
        )
    }
}

/// Why a move was refused by the rules engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("no piece on {0}")]
    EmptySquare(Position),

    #[error("the piece on {0} does not belong to the side to move")]
    WrongSide(Position),

    #[error("{0} is not a legal move")]
    NotLegal(Move),

    #[error("the game is already over")]
    GameOver,
}

/// Authoritative game record: the board, whose turn it is, and resignation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    board: Board,
    side_to_move: Color,
    #[serde(default)]
    resigned: Option<Color>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Starting position, white to move
    pub fn new() -> Self {
        Self::from_position(Board::starting(), Color::White)
    }

    /// A game set up from an arbitrary position
    pub fn from_position(board: Board, side_to_move: Color) -> Self {
        Self {
            board,
            side_to_move,
            resigned: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// The side that resigned, if any
    pub fn resigned(&self) -> Option<Color> {
        self.resigned
    }

    /// Legal moves for the piece on `pos`; empty unless it belongs to the side to move
    pub fn legal_moves(&self, pos: Position) -> Vec<Move> {
        match self.board.get(pos) {
            Some(piece) if piece.color == self.side_to_move => self.safe_moves(pos, piece),
            _ => Vec::new(),
        }
    }

    // Candidate moves of `piece` that do not leave its own king attacked.
    // Each candidate is tried on a copy; the live board is never touched.
    fn safe_moves(&self, pos: Position, piece: Piece) -> Vec<Move> {
        piece_moves(&self.board, pos)
            .into_iter()
            .filter(|mv| {
                let mut probe = self.board.copy();
                play(&mut probe, mv);
                !king_attacked(&probe, piece.color)
            })
            .collect()
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        king_attacked(&self.board, color)
    }

    /// Whether any piece of `color` has at least one legal move, whoever is to move
    pub fn has_legal_move(&self, color: Color) -> bool {
        self.board
            .pieces()
            .filter(|(_, piece)| piece.color == color)
            .any(|(pos, piece)| !self.safe_moves(pos, piece).is_empty())
    }

    pub fn is_in_checkmate(&self, color: Color) -> bool {
        self.is_in_check(color) && !self.has_legal_move(color)
    }

    pub fn is_in_stalemate(&self, color: Color) -> bool {
        !self.is_in_check(color) && !self.has_legal_move(color)
    }

    /// Derived on demand from the board and side to move
    pub fn status(&self) -> GameStatus {
        if self.resigned.is_some() {
            return GameStatus::Resigned;
        }
        let color = self.side_to_move;
        let in_check = self.is_in_check(color);
        match (in_check, self.has_legal_move(color)) {
            (true, false) => GameStatus::Checkmate,
            (false, false) => GameStatus::Stalemate,
            (true, true) => GameStatus::Check,
            (false, true) => GameStatus::InProgress,
        }
    }

    pub fn is_over(&self) -> bool {
        self.status().is_terminal()
    }

    /// Plays `mv` for the side to move and hands the turn to the other side.
    pub fn apply_move(&mut self, mv: Move) -> Result<(), MoveError> {
        if self.resigned.is_some() {
            return Err(MoveError::GameOver);
        }
        let piece = self
            .board
            .get(mv.start)
            .ok_or(MoveError::EmptySquare(mv.start))?;
        if piece.color != self.side_to_move {
            return Err(MoveError::WrongSide(mv.start));
        }
        if !self.safe_moves(mv.start, piece).contains(&mv) {
            return Err(MoveError::NotLegal(mv));
        }

        play(&mut self.board, &mv);
        self.side_to_move = self.side_to_move.opponent();
        Ok(())
    }

    /// Records that `color` gave up; no further moves are accepted.
    pub fn resign(&mut self, color: Color) -> Result<(), MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }
        self.resigned = Some(color);
        Ok(())
    }
}

fn play(board: &mut Board, mv: &Move) {
    let Some(piece) = board.get(mv.start) else {
        return;
    };
    let placed = match mv.promotion {
        Some(kind) => Piece::new(piece.color, kind),
        None => piece,
    };
    board.set(mv.start, None);
    board.set(mv.end, Some(placed));
}

// A missing king is treated as "not in check".
fn king_attacked(board: &Board, color: Color) -> bool {
    let Some(king) = board.king_position(color) else {
        return false;
    };
    board
        .pieces()
        .filter(|(_, piece)| piece.color != color)
        .any(|(pos, _)| piece_moves(board, pos).iter().any(|mv| mv.end == king))
}
