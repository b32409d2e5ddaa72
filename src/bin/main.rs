use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use rpg_server::{
    config::settings,
    db::{GameStore, MemoryStore, PgStore},
    http, metrics,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    // Configuration
    let settings = match settings() {
        Ok(settings) => settings.clone(),
        Err(e) => {
            log::error!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Store
    let store: Arc<dyn GameStore> = match settings.database_url.as_deref() {
        Some(url) => match PgStore::connect(&settings, url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                log::error!("failed to open Postgres store: {e:?}");
                std::process::exit(1);
            }
        },
        None => {
            log::warn!("DATABASE_URL not set, using the in-memory store (data is lost on exit)");
            Arc::new(MemoryStore::new())
        }
    };

    let prometheus = metrics::build().map_err(std::io::Error::other)?;
    let server_addr = settings.server_addr.clone();
    let store = web::Data::from(store);
    let settings = web::Data::new(settings);

    log::info!("listening on {server_addr}");
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(prometheus.clone())
            .app_data(store.clone())
            .app_data(settings.clone())
            .configure(http::routes::init_routes)
    })
    .bind(&server_addr)?
    .run()
    .await
}
