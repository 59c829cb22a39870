use crate::websocket::GameSync;

/// Application state shared between connections
pub struct AppState {
    pub sync: GameSync,
}
