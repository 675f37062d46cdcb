//! Group operations

use tracing::info;
use uuid::Uuid;

use crate::db::{Collection, DocumentStore, Filter};
use crate::models::{Group, GroupStatus, GroupUpdate, NewGroup, Record};
use crate::records::{
    delete_record, find_records, get_record, insert_record, list_records, search_term,
    select_fields,
};
use crate::{Error, FieldErrors, Result};

/// Create a group for an existing cycle and level
pub async fn create(store: &DocumentStore, new_group: NewGroup) -> Result<Group> {
    let mut errors = FieldErrors::new();
    if !store.exists(Collection::Ciclos, &new_group.ciclo_id).await? {
        errors.add("ciclo_id", "Select a valid cycle.");
    }
    if !store.exists(Collection::Niveles, &new_group.nivel_id).await? {
        errors.add("nivel_id", "Select a valid level.");
    }
    errors.into_result()?;

    let id = match new_group.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => Uuid::new_v4().simple().to_string(),
    };
    let group = new_group.into_group(id);
    insert_record(store, &group).await?;
    info!("Created group {} ({})", group.name, group.id);
    Ok(group)
}

pub async fn get(store: &DocumentStore, id: &str) -> Result<Group> {
    get_record(store, id).await
}

pub async fn list(store: &DocumentStore, limit: i64, offset: i64) -> Result<Vec<Group>> {
    list_records(store, limit, offset).await
}

pub async fn count(store: &DocumentStore) -> Result<i64> {
    store.count(Group::COLLECTION).await
}

/// Search by name fragment, status and cycle
pub async fn search(
    store: &DocumentStore,
    name: Option<&str>,
    status: Option<GroupStatus>,
    cycle_id: Option<&str>,
) -> Result<Vec<Group>> {
    let mut filter = Filter::new();
    if let Some(name) = search_term(name) {
        filter = filter.contains("nombre_grupo", name);
    }
    if let Some(status) = status {
        filter = filter.eq("estado", status.as_str());
    }
    if let Some(cycle_id) = search_term(cycle_id) {
        filter = filter.eq("ciclo_id", cycle_id);
    }
    find_records(store, &filter).await
}

/// Change a group's name and status
pub async fn update(store: &DocumentStore, id: &str, update: &GroupUpdate) -> Result<Group> {
    update.validate().into_result()?;

    let mut group: Group = get_record(store, id).await?;
    group.name = update.nombre_grupo.clone();
    group.status = update.estado;
    let set = select_fields(&group, &["nombre_grupo", "estado"])?;
    store.update_fields(Group::COLLECTION, id, set).await?;
    Ok(group)
}

/// Delete a group together with its enrollments
pub async fn delete(store: &DocumentStore, id: &str) -> Result<()> {
    if !store.exists(Group::COLLECTION, id).await? {
        return Err(Error::NotFound(format!("{} {}", Group::COLLECTION, id)));
    }
    let removed = store
        .delete_where(Collection::Inscripciones, &Filter::new().eq("grupo_id", id))
        .await?;
    delete_record::<Group>(store, id).await?;
    info!("Deleted group {} and {} enrollment(s)", id, removed);
    Ok(())
}
