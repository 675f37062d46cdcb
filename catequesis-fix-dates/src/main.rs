//! catequesis-fix-dates - one-off rewrite of embedded dates into `YYYY-MM-DD` strings
//!
//! Connects to the store named by CATEQUESIS_DB_HOST / CATEQUESIS_DB_NAME and
//! normalizes the baptism, grade, certificate, attendance and session dates.
//! Safe to re-run: documents already holding strings are left untouched.

use anyhow::{Context, Result};
use catequesis_common::config::StoreConfigResolver;
use catequesis_common::db::connect_existing;
use catequesis_common::normalize::{date_fix_plan, run_plan};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let resolver = StoreConfigResolver::new();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(resolver.log_level())),
        )
        .init();

    info!("Starting catequesis-fix-dates v{}", env!("CARGO_PKG_VERSION"));
    if let Some(e) = resolver.load_error() {
        warn!("{}", e);
    }

    let config = resolver.resolve();
    // Nothing is written until the connection succeeds
    let store = connect_existing(&config)
        .await
        .with_context(|| format!("Failed to connect to database {}", config.db_name))?;
    info!("✓ Connected to {}", config.db_name);

    let reports = run_plan(&store, &date_fix_plan())
        .await
        .context("Date normalization aborted")?;

    for report in &reports {
        info!(
            "{}: {} scanned, {} modified",
            report.collection, report.scanned, report.modified
        );
        if report.skipped > 0 || report.unreadable > 0 || report.window_failures > 0 {
            warn!(
                "{}: {} update(s) failed, {} unreadable document(s), {} validation step(s) failed",
                report.collection, report.skipped, report.unreadable, report.window_failures
            );
        }
    }

    info!("Done");
    Ok(())
}
