use actix_web::{web, App, HttpServer};
use log::info;
use std::io;
use std::sync::Arc;

use chess_sync_server::config::ServerConfig;
use chess_sync_server::identity::MemoryIdentity;
use chess_sync_server::models::AppState;
use chess_sync_server::registry::SessionRegistry;
use chess_sync_server::routes::configure_routes;
use chess_sync_server::store::MemoryGameStore;
use chess_sync_server::websocket::GameSync;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config =
        ServerConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let store = Arc::new(MemoryGameStore::new());
    for game_id in &config.games {
        store.create_game(*game_id);
    }
    let identity = Arc::new(MemoryIdentity::new());
    for (token, username) in &config.players {
        identity.register(token.as_str(), username.as_str());
    }
    info!(
        "Seeded {} game(s) and {} player(s)",
        config.games.len(),
        config.players.len()
    );

    let app_state = web::Data::new(AppState {
        sync: GameSync::new(Arc::new(SessionRegistry::new()), store, identity),
    });

    info!("Starting chess sync server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(configure_routes)
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}
