use tracing_subscriber::EnvFilter;

mod api;
mod camera;
mod config;
mod detect;
mod frame;
mod game;
mod garden;
mod runtime;
mod storage;
mod tracking;

use api::AppState;
use config::Config;
use runtime::Command;
use storage::SaveStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sortquest=debug".parse()?))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    tracing::info!(
        backend = ?config.detector.backend,
        camera = config.camera.index,
        fps = config.camera.fps,
        "configuration loaded"
    );

    let store = SaveStore::new(&config.game.save_file);
    let port = config.http.port;
    let (game, game_task) = runtime::spawn_game(config, store);

    let server_state = AppState::new(game.clone());
    let server_handle = tokio::spawn(async move {
        if let Err(e) = api::start_server(server_state, port).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
        result = server_handle => {
            if let Err(e) = result {
                tracing::error!("server task failed: {}", e);
            }
        }
    }

    game.send(Command::Shutdown);
    if let Err(e) = game_task.await {
        tracing::error!("game task failed: {}", e);
    }

    tracing::info!("shutdown complete");
    Ok(())
}
