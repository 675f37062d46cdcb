//! Level operations

use crate::db::{Collection, DocumentStore, Filter};
use crate::models::{Level, Record};
use crate::records::{delete_record, get_record, insert_record, list_records, replace_record};
use crate::{Error, Result};

pub async fn create(store: &DocumentStore, level: &Level) -> Result<()> {
    insert_record(store, level).await.map(|_| ())
}

pub async fn get(store: &DocumentStore, id: &str) -> Result<Level> {
    get_record(store, id).await
}

pub async fn list(store: &DocumentStore, limit: i64, offset: i64) -> Result<Vec<Level>> {
    list_records(store, limit, offset).await
}

pub async fn count(store: &DocumentStore) -> Result<i64> {
    store.count(Level::COLLECTION).await
}

pub async fn update(store: &DocumentStore, id: &str, mut level: Level) -> Result<Level> {
    level.id = id.to_string();
    replace_record(store, &level).await?;
    Ok(level)
}

/// Delete a level no group refers to
pub async fn delete(store: &DocumentStore, id: &str) -> Result<()> {
    let groups = store
        .count_where(Collection::Grupos, &Filter::new().eq("nivel_id", id))
        .await?;
    if groups > 0 {
        return Err(Error::Conflict(format!(
            "Level {} is used by {} group(s)",
            id, groups
        )));
    }
    delete_record::<Level>(store, id).await
}
