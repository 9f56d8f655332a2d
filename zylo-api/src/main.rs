//! zylo-api - ZyloFM REST backend
//!
//! Serves accounts, DJ profiles, mix uploads, moderation and the voice
//! assistant library over HTTP.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zylo_api::media::store_from_config;
use zylo_api::services::{seed_admin, SeedOutcome};
use zylo_api::{build_router, AppState};
use zylo_common::auth::TokenIssuer;
use zylo_common::config::{load_toml_config, ConfigOverrides, ServiceConfig};
use zylo_common::db::init_database;

/// Command-line arguments for zylo-api
#[derive(Parser, Debug)]
#[command(name = "zylo-api")]
#[command(about = "ZyloFM REST backend")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "ZYLO_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(short, long, env = "ZYLO_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "ZYLO_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zylo_api=info,zylo_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting ZyloFM API (zylo-api) v{}", env!("CARGO_PKG_VERSION"));

    let toml = load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let config = ServiceConfig::resolve(
        ConfigOverrides {
            bind_addr: args.bind,
            port: args.port,
            database_path: args.database,
        },
        toml,
    )
    .context("Invalid configuration")?;

    info!("Environment: {}", config.environment);
    info!("Database path: {}", config.database_path.display());
    if config.allow_admin_upload {
        info!("Admin mix uploads enabled");
    }

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    if let SeedOutcome::Seeded(email) = seed_admin(&pool, &config.admin_seed)
        .await
        .context("Failed to seed admin account")?
    {
        info!("Admin account ready: {}", email);
    }

    let media = store_from_config(&config.cloudinary).context("Failed to configure media store")?;
    let tokens = TokenIssuer::new(&config.jwt.secret, config.jwt.expiry_hours);

    let state = AppState::new(pool, tokens, media, config.allow_admin_upload);
    let app = build_router(state);

    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("zylo-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
