mod config;
mod error;
mod handlers;
mod models;
mod services;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use services::preset_store::PresetStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,actix_web=info")),
        )
        .init();

    let config = Config::from_env();
    let store = Arc::new(PresetStore::new());
    let max_upload_bytes = config.max_upload_bytes;

    info!("Server starting at {}", config.server_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .app_data(web::Data::new(store.clone()))
            .service(
                web::scope("/api")
                    .configure(handlers::report_handler::config)
                    .configure(handlers::preset_handler::config),
            )
    })
    .bind(&config.server_addr)?
    .run()
    .await
}
