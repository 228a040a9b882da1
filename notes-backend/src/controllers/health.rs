use actix_web::{web, HttpResponse, Responder};
use std::time::Duration;

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upper bound for /api/sleep
const MAX_SLEEP_MS: u64 = 10_000;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
    cfg.service(web::resource("/api/sleep/{ms}").route(web::get().to(sleep)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": VERSION,
        "store_backend": state.notes.store().backend_name(),
        "notes_dir": state.config.notes_dir.to_string_lossy(),
        "uptime_secs": state.started_at.elapsed().as_secs()
    }))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}

/// Respond after a delay; handy for exercising slow-network UI states
async fn sleep(path: web::Path<u64>) -> impl Responder {
    let ms = path.into_inner().min(MAX_SLEEP_MS);
    tokio::time::sleep(Duration::from_millis(ms)).await;
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}
