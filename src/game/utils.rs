use crate::game::{Color, Game, GameStatus, Move};

/// Text announcing a move to the rest of the room
pub fn describe_move(username: &str, mv: &Move) -> String {
    format!("{} moved {}", username, mv)
}

/// Announcement for a game that just ended, or `None` while it is still running
pub fn terminal_notice(game: &Game) -> Option<String> {
    let loser = game.side_to_move();
    match game.status() {
        GameStatus::Checkmate => Some(format!(
            "Checkmate: {} is mated, {} wins",
            loser,
            loser.opponent()
        )),
        GameStatus::Stalemate => Some(format!(
            "Stalemate: {} has no legal move, the game is drawn",
            loser
        )),
        GameStatus::Resigned => {
            let resigned = game.resigned().unwrap_or(loser);
            Some(format!("{} resigned, {} wins", resigned, resigned.opponent()))
        }
        GameStatus::InProgress | GameStatus::Check => None,
    }
}

/// Announcement that `color` is in check after the last move
pub fn check_notice(color: Color) -> String {
    format!("{} is in check", color)
}
