//! HTTP service behind the daily log tracker.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod services;
pub mod storage;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use config::Config;
use handlers::{create_log, delete_log, list_logs, update_log};
use services::LogService;
use storage::ConnectionManager;

pub const LOGS_PATH: &str = "/api/logs";

pub fn build_service(config: &Config) -> Arc<LogService> {
    Arc::new(LogService::new(ConnectionManager::new(&config.database_url)))
}

pub fn build_router(config: &Config, service: Arc<LogService>) -> Router {
    let api = Router::new()
        .route(
            LOGS_PATH,
            get(list_logs)
                .post(create_log)
                .put(update_log)
                .delete(delete_log),
        )
        .with_state(service);

    let app = match config.static_dir() {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
