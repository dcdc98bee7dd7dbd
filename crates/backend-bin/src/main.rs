// ============================
// portfolio-backend-bin/src/main.rs
// ============================
//! Tokio / Axum entry-point for the portfolio server.
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use backend_lib::{
    config::{Settings, DEFAULT_CONFIG_FILE},
    storage::{Database, Gateway},
    ws_router, AppState,
};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "portfolio", about = "Personal portfolio web server")]
struct Args {
    /// Settings file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Address to listen on, overriding the settings file
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Drop every table before bootstrapping
    #[arg(long, conflicts_with = "no_purge")]
    purge: bool,

    /// Keep existing tables
    #[arg(long)]
    no_purge: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load_from(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }
    if args.purge {
        settings.purge_on_start = true;
    } else if args.no_purge {
        settings.purge_on_start = false;
    }

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let gateway = Database::from_settings(&settings.database)?;
    tracing::info!(dialect = %gateway.dialect(), "using database");

    let addr = settings.bind_addr;
    let purge = settings.purge_on_start;
    let state = Arc::new(AppState::new(Arc::new(gateway), settings)?);
    state.bootstrap(purge).await;

    let app = ws_router::create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
