//! Cycle operations

use crate::db::{from_document, Collection, DocumentStore, Filter};
use crate::models::{Cycle, Record};
use crate::records::{delete_record, get_record, insert_record, replace_record};
use crate::{Error, Result};

pub async fn create(store: &DocumentStore, cycle: &Cycle) -> Result<()> {
    insert_record(store, cycle).await.map(|_| ())
}

pub async fn get(store: &DocumentStore, id: &str) -> Result<Cycle> {
    get_record(store, id).await
}

/// Every cycle, most recent start first
pub async fn list(store: &DocumentStore) -> Result<Vec<Cycle>> {
    let mut cycles = store
        .find_all(Cycle::COLLECTION)
        .await?
        .into_iter()
        .map(from_document)
        .collect::<Result<Vec<Cycle>>>()?;
    cycles.sort_by(|a, b| b.starts_at.cmp(&a.starts_at).then_with(|| a.id.cmp(&b.id)));
    Ok(cycles)
}

pub async fn update(store: &DocumentStore, id: &str, mut cycle: Cycle) -> Result<Cycle> {
    cycle.id = id.to_string();
    replace_record(store, &cycle).await?;
    Ok(cycle)
}

/// Delete a cycle no group refers to
pub async fn delete(store: &DocumentStore, id: &str) -> Result<()> {
    let groups = store
        .count_where(Collection::Grupos, &Filter::new().eq("ciclo_id", id))
        .await?;
    if groups > 0 {
        return Err(Error::Conflict(format!(
            "Cycle {} is used by {} group(s)",
            id, groups
        )));
    }
    delete_record::<Cycle>(store, id).await
}
