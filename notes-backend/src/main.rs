use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

use notes_backend::config::Config;
use notes_backend::controllers;
use notes_backend::db;
use notes_backend::mirror::FsMirror;
use notes_backend::service::NoteService;
use notes_backend::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    log::info!("Notes backend v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    let port = config.port;

    log::info!(
        "Initializing {} table store ({})",
        config.store_backend.as_str(),
        config.database_url
    );
    let store = db::open_store(&config).map_err(|e| {
        log::error!("Failed to initialize note store: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    log::info!("Mirroring note bodies to {}", config.notes_dir.display());
    let mirror = Arc::new(FsMirror::new(&config.notes_dir));

    let notes = Arc::new(NoteService::new(store, mirror));

    // Report drift left over from a previous run; nothing is repaired
    match notes.audit().await {
        Ok(status) if status.is_consistent() => log::info!("[MIRROR] Mirror is in sync"),
        Ok(_) => log::warn!("[MIRROR] Mirror is out of sync, see /api/notes/mirror/status"),
        Err(e) => log::warn!("[MIRROR] Startup audit failed: {}", e),
    }

    let started_at = std::time::Instant::now();

    log::info!("Notes backend listening on http://0.0.0.0:{}", port);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                notes: Arc::clone(&notes),
                config: config.clone(),
                started_at,
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config_routes)
            .configure(controllers::notes::config)
    })
    .bind(("0.0.0.0", port))?
    .run();

    let server_handle = server.handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            log::warn!("Failed to listen for Ctrl+C");
            return;
        }
        log::info!("Received Ctrl+C, shutting down...");

        let server_stop = server_handle.stop(true);
        if tokio::time::timeout(std::time::Duration::from_secs(5), server_stop).await.is_err() {
            log::warn!("Timeout waiting for HTTP server to stop, forcing exit...");
        }

        log::info!("Shutdown complete");
    });

    server.await
}
