use std::net::SocketAddr;

use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use configs::AppConfig;
use service::Marketplace;

use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Where the running configuration came from.
#[derive(Debug)]
pub enum ConfigSource {
    File,
    /// The file could not be used; the message says why.
    Environment(String),
}

/// Config file when present, otherwise defaults plus environment overrides.
/// Runs before logging is set up, so the caller reports the source.
pub fn load_config() -> anyhow::Result<(AppConfig, ConfigSource)> {
    match AppConfig::load_and_validate() {
        Ok(cfg) => Ok((cfg, ConfigSource::File)),
        Err(e) => Ok((AppConfig::from_env()?, ConfigSource::Environment(e.to_string()))),
    }
}

/// Connect, probe the store and assemble the router.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    let marketplace = Marketplace::connect(db, cfg.pagination, cfg.discovery).await;
    Ok(routes::build_router(ServerState::new(marketplace), build_cors()))
}

/// Serve `cfg` until the listener fails.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
