//! Authoritative chess server: a rules engine plus the live room layer that
//! assigns roles, checks turns and fans out state over WebSockets.

pub mod config;
pub mod error;
pub mod game;
pub mod identity;
pub mod models;
pub mod registry;
pub mod routes;
pub mod store;
pub mod websocket;

pub use error::SyncError;
