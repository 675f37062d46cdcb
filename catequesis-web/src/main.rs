//! catequesis-web - record service for the parish catechism program
//!
//! Serves catechumens, levels, cycles, groups and enrollments as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use catequesis_common::config::StoreConfigResolver;
use catequesis_common::db::open_store;
use catequesis_web::{build_router, AppState};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "catequesis-web")]
#[command(about = "Catechism program records service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "CATEQUESIS_PORT", default_value = "5780")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config file is read before tracing so its logging level can apply
    let resolver = StoreConfigResolver::new();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(resolver.log_level())),
        )
        .init();

    info!(
        "Starting catequesis-web v{}",
        env!("CARGO_PKG_VERSION")
    );
    if let Some(e) = resolver.load_error() {
        warn!("{}", e);
    }

    let config = resolver.resolve();
    let db_path = config.database_path()?;
    info!("Database path: {}", db_path.display());

    let store = match open_store(&config).await {
        Ok(store) => {
            info!("✓ Connected to database");
            store
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e).context("Failed to open database");
        }
    };

    let app = build_router(AppState::new(store));

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("catequesis-web listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
