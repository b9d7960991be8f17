//! # USOF API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::HttpServer;

mod app;
mod bootstrap;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

#[cfg(test)]
mod tests;

use config::AppConfig;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        production = config.production,
        "Starting USOF API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await;

    if let Some(admin) = &config.admin {
        bootstrap::ensure_admin(&state, admin).await?;
    }

    let session = config.session.clone();
    HttpServer::new(move || app::build_app(state.clone(), &session))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await?;

    Ok(())
}
