//! Crop Analysis Service - Main entry point
//!
//! Serves the analysis pipeline over HTTP. Records go to Postgres when
//! `DATABASE_URL` is set and to an in-memory store otherwise.

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use crop_analysis_service::{
    config::log_filter, handlers, AnalysisGateway, AppState, Config, InMemoryResultStore,
    PgResultStore, SharedResultStore,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(log_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    info!(
        "Configuration loaded: model={}, timeout={}s, history_limit={}/{}",
        config.ai_model,
        config.ai_request_timeout_secs,
        config.history_default_limit,
        config.history_max_limit
    );

    let gateway = AnalysisGateway::new(config.gateway_config())
        .context("Failed to initialize analysis gateway")?;

    if gateway.is_configured() {
        info!("AI gateway credential configured");
    } else {
        warn!("AI_GATEWAY_API_KEY not set; analysis requests will fail with a configuration error");
    }

    let store = init_store(&config).await?;
    info!(store = store.backend(), "Result store initialized");

    let state = AppState {
        gateway,
        store,
        history: config.history(),
    };

    let bind_address = config.bind_address();
    let cors_origins = config.cors_allowed_origins.clone();

    info!("Crop Analysis Service listening on {}", bind_address);

    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in cors_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server error")?;

    info!("Shutting down Crop Analysis Service");

    Ok(())
}

async fn init_store(config: &Config) -> Result<SharedResultStore> {
    if config.database_url.is_empty() {
        warn!("DATABASE_URL not set, records are kept in memory and lost on restart");
        return Ok(Arc::new(InMemoryResultStore::new()));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            anyhow::anyhow!("Database connection error: {}", e)
        })?;

    info!("Database connection pool initialized");

    let store = PgResultStore::new(pool);
    if config.run_migrations {
        store.migrate().await.context("Failed to run migrations")?;
        info!("Database migrations applied");
    }

    Ok(Arc::new(store))
}
