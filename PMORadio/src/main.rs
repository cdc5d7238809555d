use std::sync::Arc;

use pmoconfig::get_config;
use pmoplayer::{HttpStreamBackend, PlayerConfigExt, PlayerServerExt, PlayerService};
use pmoserver::{LoggingOptions, ServerBuilder};
use pmostations::{StationCatalog, StationsConfigExt, StationsServerExt};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_config();

    // ========== PHASE 1 : Serveur et logs ==========

    let mut server = ServerBuilder::new_configured().build();
    server
        .init_logging(LoggingOptions::from_config(&config))
        .await;

    server
        .add_route("/info", || async {
            serde_json::json!({
                "name": "PMORadio",
                "version": env!("CARGO_PKG_VERSION"),
            })
        })
        .await;

    // ========== PHASE 2 : Catalogue et lecteur ==========

    info!("📻 Initializing station catalog...");
    let catalog = Arc::new(StationCatalog::in_memory());
    if config.get_stations_seed_defaults()? {
        let seeded = catalog.seed(config.get_stations_seed()?).await?;
        info!("✅ {} station(s) seeded", seeded);
    }

    info!("🎧 Starting player service...");
    let backend = Arc::new(HttpStreamBackend::new(config.http_stream_options()?)?);
    let (player, player_task) =
        PlayerService::spawn(catalog.clone(), backend, config.player_options()?).await?;

    server.register_stations_api(catalog).await;
    server.register_player_api(player.clone()).await;
    server.add_redirect("/", "/swagger-ui/player").await;

    // ========== PHASE 3 : Démarrage du serveur ==========

    info!("🌐 Starting HTTP server...");
    server.start().await?;

    info!("✅ PMORadio is ready!");
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    if let Err(e) = player.shutdown().await {
        warn!("⚠️ Player service already stopped: {}", e);
    }
    let _ = player_task.await;

    Ok(())
}
