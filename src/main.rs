//! Salmandyar care platform service.
//!
//! Main entry point: loads configuration, opens the database, starts
//! the live-update hub, and serves the HTTP API.

use actix::Actor;
use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

use salmandyar::{api, config, db, live};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = config::load_config()?;

    // Connect to database (creates the schema on first run)
    let database = db::Database::connect(&config.database.url).await?;

    // Start the live-update hub
    let live_server = live::LiveServer::new().start();

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(%bind_addr, "starting salmandyar service");

    let state = web::Data::new(api::AppState {
        db: database,
        config: config.clone(),
        live: live_server,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .configure(api::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
