mod api;
mod config;
mod constants;
mod fetch;
mod filter;
mod layers;
mod loaders;
mod normalize;
mod session;
mod storage;
mod types;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use reqwest::Client;
use tokio::fs;
use tokio::sync::RwLock;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{healthz, map, meta};
use crate::config::Config;
use crate::loaders::load_all;
use crate::session::SessionCache;
use crate::types::AppState;
use crate::utils::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Arc::new(Config::from_env()?);
    fs::create_dir_all(&cfg.cache_dir)
        .await
        .with_context(|| format!("Failed to create {}", cfg.cache_dir.display()))?;
    fs::create_dir_all(&cfg.data_dir)
        .await
        .with_context(|| format!("Failed to create {}", cfg.data_dir.display()))?;

    let http = Client::builder()
        .timeout(cfg.request_timeout)
        .user_agent("solar-map/1.0")
        .build()
        .context("Failed to build reqwest client")?;

    // Sequential initial load: all datasets are in place before the first
    // render request arrives.
    let mut session = SessionCache::new(cfg.session_ttl);
    session.store(load_all(&cfg, &http).await);

    let state = AppState {
        cfg: cfg.clone(),
        http,
        session: Arc::new(RwLock::new(session)),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/meta", get(meta))
        .route("/v1/map", get(map))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.listen_addr))?;

    info!("Solar map service listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;
    Ok(())
}
