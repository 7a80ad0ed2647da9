use std::sync::Arc;

use crate::ai::AiProvider;
use crate::model::{DbConnection, ModelManager};
use crate::utils::signal::shutdown_signal;
use crate::{error::AppResult, web::AppState};
use axum::Router;
use tokio::net::TcpListener;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod ai;
pub mod auth;
pub mod engine;
pub mod error;
pub mod model;
pub mod utils;
pub mod web;

static APPLICATION_NAME: &str = "gritflow";


pub async fn build_server() -> AppResult<(AppState, Router)> {
    let use_local = cfg!(debug_assertions);
    let config = Config::get_or_init(use_local).await;

    let db = DbConnection::connect(config.app().database_uri())?;
    db.migrate().await?;

    let ai = ai::provider_from_config(config.ai());
    let state = AppState::new(ModelManager::new(db), ai, config.app().demo_user());
    let app = web::routes::build_app(state.clone(), config);
    Ok((state, app))
}

/// Server over an already migrated pool, using the local config file.
pub async fn build_server_with_pool(db: DbConnection) -> AppResult<(AppState, Router)> {
    let config = Config::get_or_init(true).await;
    let ai = ai::provider_from_config(config.ai());
    build_server_with(db, ai, config.app().demo_user()).await
}

/// Like [`build_server_with_pool`] with an explicit AI provider and
/// anonymous-access policy.
pub async fn build_server_with(
    db: DbConnection,
    ai: Arc<dyn AiProvider>,
    demo_user: bool,
) -> AppResult<(AppState, Router)> {
    let config = Config::get_or_init(true).await;

    let state = AppState::new(ModelManager::new(db), ai, demo_user);
    let app = web::routes::build_app(state.clone(), config);
    Ok((state, app))
}

#[tracing::instrument]
pub async fn serve() -> AppResult<()> {
    let (_, app) = build_server().await?;
    let config = Config::get_or_init(cfg!(debug_assertions)).await;
    let listener = TcpListener::bind(config.host().bindto()).await?;

    tracing::info!("axum is starting at: {}", config.host().bindto());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

pub fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}

#[tracing::instrument]
pub async fn run() -> AppResult<()> {
    setup_trace();
    serve().await?;
    Ok(())
}
