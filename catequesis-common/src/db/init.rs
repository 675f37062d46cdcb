//! Store initialization
//!
//! Opens (or creates) the SQLite file backing the document store and makes sure
//! every collection table, unique index and collection validator exists.
//! Initialization is idempotent and never touches existing documents or an
//! existing collection's validator.

use crate::config::StoreConfig;
use crate::db::collections::Collection;
use crate::db::store::DocumentStore;
use crate::db::validation::ValidationLevel;
use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// How long a writer waits for another writer's lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the configured store, creating the database file if needed
pub async fn open_store(config: &StoreConfig) -> Result<DocumentStore> {
    let db_path = config.database_path()?;
    init_store(&db_path).await
}

/// Open the configured store only if its database file already exists
///
/// Maintenance jobs use this so a mistyped location fails instead of silently
/// creating an empty store.
pub async fn connect_existing(config: &StoreConfig) -> Result<DocumentStore> {
    let db_path = config.database_path()?;
    if !db_path.exists() {
        return Err(Error::Config(format!(
            "Database not found: {}",
            db_path.display()
        )));
    }
    init_store(&db_path).await
}

/// Initialize the store at a database path
pub async fn init_store(db_path: &Path) -> Result<DocumentStore> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Applied to every pooled connection
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let options = SqliteConnectOptions::from_str(&db_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new store: {}", db_path.display());
    } else {
        info!("Opened existing store: {}", db_path.display());
    }

    create_collections_table(&pool).await?;
    for collection in Collection::ALL {
        create_collection(&pool, collection).await?;
    }

    Ok(DocumentStore::new(pool))
}

/// Collection catalog: validation level and validator per collection
async fn create_collections_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _collections (
            name TEXT PRIMARY KEY,
            validation_level TEXT NOT NULL DEFAULT 'strict',
            validator TEXT NOT NULL DEFAULT '{}',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_collection(pool: &SqlitePool, collection: Collection) -> Result<()> {
    let table = collection.name();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            _id TEXT PRIMARY KEY,
            body TEXT NOT NULL CHECK (json_valid(body))
        )
        "#,
        table
    ))
    .execute(pool)
    .await?;

    for index in collection.unique_indexes() {
        let columns = index
            .fields
            .iter()
            .map(|f| format!("json_extract(body, '$.{}')", f))
            .collect::<Vec<_>>()
            .join(", ");
        sqlx::query(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
            index.name, table, columns
        ))
        .execute(pool)
        .await?;
    }

    let validator = serde_json::to_string(&collection.default_validator())?;
    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO _collections (name, validation_level, validator) VALUES (?, ?, ?)",
    )
    .bind(table)
    .bind(ValidationLevel::Strict.as_str())
    .bind(validator)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted > 0 {
        debug!("Created collection {} with default validator", table);
    }

    Ok(())
}
