mod action;
mod app;
mod player;
mod theme;
mod widgets;

use std::sync::Arc;

use podcast_core::catalog::HttpCatalog;
use podcast_core::config::Config;
use podcast_core::favourites::FavouritesStore;
use podcast_core::playback::PlaybackSlot;
use podcast_core::platform;
use podcast_core::storage::FileStore;
use podcast_core::view_state::ViewStateMachine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("podcasts.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; keep HTTP client internals quiet by default.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("podcasts log: {}", log_path.display());
    tracing::info!("podcasts starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("config: {}, using defaults", e);
        Config::default()
    });

    // ── Services ─────────────────────────────────────────────────────────────
    let catalog = HttpCatalog::new(config.catalog.base_url.clone(), config.catalog.timeout())?;
    let favourites = FavouritesStore::init(Box::new(FileStore::new(config.storage.dir.clone())));
    let machine = ViewStateMachine::new(favourites, PlaybackSlot::new());

    let binary = platform::find_player_binary(config.player.binary.as_deref());
    let player = player::Player::new(binary, config.player.volume);

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(machine, Arc::new(catalog), player);
    app.run().await?;

    Ok(())
}
