use crate::game::board::{Board, Position};
use crate::game::piece::{Color, Move, Movement, Piece, PieceType};

/// Geometrically possible moves for the piece on `from`.
///
/// Does not look at whether the move leaves the mover's own king attacked;
/// `Game::legal_moves` filters for that. Returns nothing for an empty square.
pub fn piece_moves(board: &Board, from: Position) -> Vec<Move> {
    let Some(piece) = board.get(from) else {
        return Vec::new();
    };

    let mut moves = Vec::new();
    match piece.piece_type.movement() {
        Movement::Slide(directions) => slide_moves(board, from, piece, directions, &mut moves),
        Movement::Step(offsets) => step_moves(board, from, piece, offsets, &mut moves),
        Movement::Pawn => pawn_moves(board, from, piece.color, &mut moves),
    }
    moves
}

fn slide_moves(
    board: &Board,
    from: Position,
    piece: Piece,
    directions: &[(i8, i8)],
    out: &mut Vec<Move>,
) {
    for &(dr, dc) in directions {
        let mut cursor = from;
        while let Some(next) = cursor.offset(dr, dc) {
            match board.get(next) {
                None => out.push(Move::new(from, next)),
                Some(other) => {
                    if other.color != piece.color {
                        out.push(Move::new(from, next));
                    }
                    break;
                }
            }
            cursor = next;
        }
    }
}

fn step_moves(
    board: &Board,
    from: Position,
    piece: Piece,
    offsets: &[(i8, i8)],
    out: &mut Vec<Move>,
) {
    for &(dr, dc) in offsets {
        let Some(to) = from.offset(dr, dc) else {
            continue;
        };
        match board.get(to) {
            Some(other) if other.color == piece.color => {}
            _ => out.push(Move::new(from, to)),
        }
    }
}

fn pawn_moves(board: &Board, from: Position, color: Color, out: &mut Vec<Move>) {
    let forward = color.forward();

    if let Some(one) = from.offset(forward, 0) {
        if board.get(one).is_none() {
            push_pawn_move(from, one, color, out);

            if from.row() == color.pawn_home_row() {
                if let Some(two) = one.offset(forward, 0) {
                    if board.get(two).is_none() {
                        out.push(Move::new(from, two));
                    }
                }
            }
        }
    }

    for dc in [-1, 1] {
        let Some(target) = from.offset(forward, dc) else {
            continue;
        };
        if matches!(board.get(target), Some(other) if other.color != color) {
            push_pawn_move(from, target, color, out);
        }
    }
}

fn push_pawn_move(from: Position, to: Position, color: Color, out: &mut Vec<Move>) {
    if to.row() == color.promotion_row() {
        for kind in PieceType::PROMOTIONS {
            out.push(Move::promoting(from, to, kind));
        }
    } else {
        out.push(Move::new(from, to));
    }
}
