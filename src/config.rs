//! Server settings read from the environment.

use std::env;

use crate::models::GameId;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: {value:?} is not a valid game id")]
    InvalidGameId { var: &'static str, value: String },

    #[error("{var}: expected token:username, got {value:?}")]
    InvalidPlayer { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP server binds to (`CHESS_BIND_ADDR`)
    pub bind_addr: String,
    /// Games seeded into the in-memory store at startup (`CHESS_GAMES`)
    pub games: Vec<GameId>,
    /// `(auth_token, username)` pairs known to the identity provider (`CHESS_PLAYERS`)
    pub players: Vec<(String, String)>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            games: vec![GameId(1)],
            players: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("CHESS_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(games) = lookup("CHESS_GAMES") {
            config.games = split_list(&games)
                .map(|id| {
                    id.parse::<u32>().map(GameId).map_err(|_| ConfigError::InvalidGameId {
                        var: "CHESS_GAMES",
                        value: id.to_string(),
                    })
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(players) = lookup("CHESS_PLAYERS") {
            config.players = split_list(&players)
                .map(|entry| match entry.split_once(':') {
                    Some((token, user)) if !token.is_empty() && !user.is_empty() => {
                        Ok((token.to_string(), user.to_string()))
                    }
                    _ => Err(ConfigError::InvalidPlayer {
                        var: "CHESS_PLAYERS",
                        value: entry.to_string(),
                    }),
                })
                .collect::<Result<_, _>>()?;
        }
        Ok(config)
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}
