mod access;
mod config;
mod db;
mod earnings;
mod errors;
mod extract;
mod models;
mod referrals;
mod revenue;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::revenue::split::SplitPolicy;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgReferralStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Circle API v{}", env!("CARGO_PKG_VERSION"));

    // Refuse to start with a split that does not cover the whole fee
    let split_policy = SplitPolicy::CURRENT;
    split_policy.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Split policy v{}: platform={}bps select={}bps founding={}bps",
        split_policy.version,
        split_policy.platform_bps,
        split_policy.select_bps,
        split_policy.founding_bps
    );

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.db_max_connections).await?;
    if config.run_migrations {
        run_migrations(&db).await?;
    }

    let state = AppState {
        store: Arc::new(PgReferralStore::new(db)),
        split_policy,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
