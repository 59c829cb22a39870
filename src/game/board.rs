use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::game::piece::{Color, Piece, PieceType};

/// A square on the board; row and column are both in 1..=8
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    row: u8,
    column: u8,
}

#[derive(Deserialize)]
struct RawPosition {
    row: u8,
    column: u8,
}

impl TryFrom<RawPosition> for Position {
    type Error = String;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Position::try_new(raw.row, raw.column)
            .ok_or_else(|| format!("position ({}, {}) is off the board", raw.row, raw.column))
    }
}

impl Position {
    /// Panics if either coordinate is outside 1..=8.
    pub fn new(row: u8, column: u8) -> Self {
        Self::try_new(row, column)
            .unwrap_or_else(|| panic!("position ({row}, {column}) is off the board"))
    }

    pub fn try_new(row: u8, column: u8) -> Option<Self> {
        if (1..=8).contains(&row) && (1..=8).contains(&column) {
            Some(Self { row, column })
        } else {
            None
        }
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn column(self) -> u8 {
        self.column
    }

    /// The square `(dr, dc)` away, or `None` when that leaves the board
    pub fn offset(self, dr: i8, dc: i8) -> Option<Position> {
        let row = self.row as i8 + dr;
        let column = self.column as i8 + dc;
        if row < 1 || column < 1 {
            return None;
        }
        Position::try_new(row as u8, column as u8)
    }

    /// Every square, row by row from row 1
    pub fn all() -> impl Iterator<Item = Position> {
        (1..=8).flat_map(|row| (1..=8).map(move |column| Position { row, column }))
    }

    fn index(self) -> (usize, usize) {
        (self.row as usize - 1, self.column as usize - 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.column - 1) as char;
        write!(f, "{}{}", file, self.row)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid square: {0:?}")]
pub struct ParsePositionError(pub String);

impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        if bytes.len() != 2 {
            return Err(ParsePositionError(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase();
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(ParsePositionError(s.to_string()));
        }
        Ok(Position {
            row: rank - b'0',
            column: file - b'a' + 1,
        })
    }
}

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

/// 8x8 grid of optional pieces, indexed `[row - 1][column - 1]`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[Option<Piece>; 8]; 8],
}

impl Board {
    /// An empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// A board holding the standard starting arrangement
    pub fn starting() -> Self {
        let mut board = Self::new();
        board.reset();
        board
    }

    pub fn get(&self, pos: Position) -> Option<Piece> {
        let (r, c) = pos.index();
        self.cells[r][c]
    }

    pub fn set(&mut self, pos: Position, piece: Option<Piece>) {
        let (r, c) = pos.index();
        self.cells[r][c] = piece;
    }

    /// An independent copy; changes to either board never show in the other
    pub fn copy(&self) -> Board {
        self.clone()
    }

    pub fn reset(&mut self) {
        self.cells = Default::default();
        for (i, kind) in BACK_RANK.iter().enumerate() {
            let column = i as u8 + 1;
            for color in [Color::White, Color::Black] {
                let back_row = if color == Color::White { 1 } else { 8 };
                self.set(Position::new(back_row, column), Some(Piece::new(color, *kind)));
                self.set(
                    Position::new(color.pawn_home_row(), column),
                    Some(Piece::new(color, PieceType::Pawn)),
                );
            }
        }
    }

    /// Occupied squares with their pieces
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        Position::all().filter_map(move |pos| self.get(pos).map(|piece| (pos, piece)))
    }

    /// First square holding the king of `color`, if there is one
    pub fn king_position(&self, color: Color) -> Option<Position> {
        self.pieces()
            .find(|(_, piece)| piece.color == color && piece.piece_type == PieceType::King)
            .map(|(pos, _)| pos)
    }
}
