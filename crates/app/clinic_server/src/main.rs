//! Clinic backend server binary.
//!
//! Connects to PostgreSQL, applies migrations and serves the API until
//! SIGINT/SIGTERM, then drains in-flight requests and closes the pool.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use clinic_api::config::{ApiConfig, DEFAULT_BIND_ADDR, DEFAULT_STATIC_DIR};
use clinic_core::auth::session::resolve_session_secret;
use clinic_core::store::{ClinicStore, PgStore};
use tracing::info;

/// CLI arguments for the clinic server.
#[derive(Parser, Debug)]
#[command(name = "clinic_server", about = "Dental clinic backend server", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// Production mode: `Secure` session cookies and no `/api/seed`.
    #[arg(long, env = "CLINIC_PRODUCTION", default_value_t = false)]
    production: bool,

    /// Directory served under `/static`.
    #[arg(long, env = "STATIC_DIR", default_value = DEFAULT_STATIC_DIR)]
    static_dir: PathBuf,
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("received SIGINT, shutting down"),
        _ = terminate() => info!("received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| "info,clinic_api=debug,clinic_core=debug".parse())?,
        )
        .init();

    let args = Args::parse();

    info!(
        bind_addr = %args.bind_addr,
        max_connections = args.max_connections,
        production = args.production,
        "starting clinic_server"
    );

    let store = PgStore::connect(&args.database_url, args.max_connections).await?;

    info!("running database migrations");
    store.migrate().await?;

    let config = ApiConfig {
        bind_addr: args.bind_addr,
        database_url: args.database_url,
        session_secret: resolve_session_secret(),
        production: args.production,
        static_dir: args.static_dir,
    };

    let store: Arc<dyn ClinicStore> = Arc::new(store);
    let state = clinic_api::AppState::new(store.clone(), config.clone());
    let app = clinic_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    store.close().await;
    served?;

    info!("clinic_server stopped");
    Ok(())
}
