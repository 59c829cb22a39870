use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::board::Position;

/// The two sides of a game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a pawn step for this side
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Row the pawns of this side start on
    pub fn pawn_home_row(self) -> u8 {
        match self {
            Color::White => 2,
            Color::Black => 7,
        }
    }

    pub fn promotion_row(self) -> u8 {
        match self {
            Color::White => 8,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "WHITE"),
            Color::Black => write!(f, "BLACK"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PieceType {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ADJACENT: [(i8, i8); 8] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
    (-2, 1),
    (-2, -1),
];

/// How a piece type travels across the board
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Movement {
    /// Repeats each offset until blocked or off the board
    Slide(&'static [(i8, i8)]),
    /// Takes each offset exactly once
    Step(&'static [(i8, i8)]),
    Pawn,
}

impl PieceType {
    /// Piece types a pawn may turn into on the far rank
    pub const PROMOTIONS: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    pub fn movement(self) -> Movement {
        match self {
            PieceType::Bishop => Movement::Slide(&DIAGONAL),
            PieceType::Rook => Movement::Slide(&ORTHOGONAL),
            PieceType::Queen => Movement::Slide(&ADJACENT),
            PieceType::King => Movement::Step(&ADJACENT),
            PieceType::Knight => Movement::Step(&KNIGHT_JUMPS),
            PieceType::Pawn => Movement::Pawn,
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceType::King => "KING",
            PieceType::Queen => "QUEEN",
            PieceType::Rook => "ROOK",
            PieceType::Bishop => "BISHOP",
            PieceType::Knight => "KNIGHT",
            PieceType::Pawn => "PAWN",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub piece_type: PieceType,
}

impl Piece {
    pub const fn new(color: Color, piece_type: PieceType) -> Self {
        Self { color, piece_type }
    }
}

/// A single move; `promotion` is only set when a pawn lands on its far rank
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub start: Position,
    pub end: Position,
    #[serde(default)]
    pub promotion: Option<PieceType>,
}

impl Move {
    pub const fn new(start: Position, end: Position) -> Self {
        Self {
            start,
            end,
            promotion: None,
        }
    }

    pub const fn promoting(start: Position, end: Position, promotion: PieceType) -> Self {
        Self {
            start,
            end,
            promotion: Some(promotion),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.promotion {
            Some(kind) => write!(f, "{} to {} (promoting to {})", self.start, self.end, kind),
            None => write!(f, "{} to {}", self.start, self.end),
        }
    }
}
