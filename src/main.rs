use anyhow::Result;
use db_ops::DocumentStore;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{info, warn};

mod config;
mod controllers;
mod db_ops;
mod errors;
mod filter;
#[cfg(test)]
mod memory_store;
mod middleware;
mod models;
mod normalize;
mod routes;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(config::Config::from_env()?);
    let store = connect_store(&config).await;
    let state = models::AppState {
        store,
        config: config.clone(),
    };
    let app = routes::get_routes()
        .layer(middleware::cors())
        .layer(middleware::trace())
        .with_state(state);

    let addr = config.addr()?;
    info!(%addr, "listening");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

/// The service still comes up without a database; store-backed routes then
/// answer with a 500 and `/test` explains why.
async fn connect_store(
    config: &config::Config,
) -> Option<Arc<dyn DocumentStore>> {
    if config.database_url.is_none() {
        warn!("DATABASE_URL is not set; running without a database");
        return None;
    }
    match db_ops::PgStore::connect(config).await {
        Ok(store) => {
            info!(database = %store.name(), "connected to database");
            Some(Arc::new(store))
        }
        Err(e) => {
            warn!(error = ?e, "could not connect to database");
            None
        }
    }
}
