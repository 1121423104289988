//! Marketplace API server: configuration is read once here and handed to
//! the HTTP layer; the process exits on Ctrl+C or when serving fails.

use std::process::ExitCode;

use configs::AppConfig;
use server::startup::{load_config, ConfigSource};
use tracing::{error, info, warn};
use uuid::Uuid;

fn main() -> ExitCode {
    // .env before anything reads RUST_LOG or DATABASE_URL
    dotenvy::dotenv().ok();
    let loaded = load_config();
    common::utils::logging::init_logging(loaded.as_ref().is_ok_and(|(cfg, _)| cfg.logging.json));

    let cfg = match loaded {
        Ok((cfg, ConfigSource::File)) => cfg,
        Ok((cfg, ConfigSource::Environment(reason))) => {
            warn!(reason = %reason, "config file unavailable, using environment");
            cfg
        }
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let instance = Uuid::new_v4();
    std::panic::set_hook(Box::new(move |panic| {
        error!(%instance, message = %panic, "unhandled panic");
    }));

    let runtime = match build_runtime(&cfg) {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        %instance,
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        host = %cfg.server.host,
        port = cfg.server.port,
        strategy = ?cfg.discovery.strategy,
        "marketplace server starting"
    );
    let code = runtime.block_on(serve_until_ctrl_c(cfg));
    info!(%instance, "marketplace server stopped");
    code
}

/// Worker count from config, else `TOKIO_WORKER_THREADS`, else tokio's default.
fn build_runtime(cfg: &AppConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let workers = cfg
        .server
        .worker_threads
        .or_else(|| std::env::var("TOKIO_WORKER_THREADS").ok()?.parse().ok());
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(n) = workers {
        builder.worker_threads(n);
    }
    builder.build()
}

async fn serve_until_ctrl_c(cfg: AppConfig) -> ExitCode {
    tokio::select! {
        res = server::run(cfg) => match res {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(error = %e, "server failed");
                ExitCode::FAILURE
            }
        },
        // handlers only read, so in-flight requests can be dropped
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl+C, shutting down");
            ExitCode::SUCCESS
        }
    }
}
