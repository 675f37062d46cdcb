//! Catechumen operations

use tracing::info;

use crate::db::{Collection, DocumentStore, Filter};
use crate::models::{Catechumen, ContactUpdate, Record};
use crate::records::{
    delete_record, find_records, get_record, insert_record, list_records, replace_record,
    search_term, select_fields,
};
use crate::{Error, Result};

pub async fn create(store: &DocumentStore, catechumen: &Catechumen) -> Result<()> {
    insert_record(store, catechumen).await?;
    info!("Registered catechumen {}", catechumen.display_name());
    Ok(())
}

pub async fn get(store: &DocumentStore, id: &str) -> Result<Catechumen> {
    get_record(store, id).await
}

pub async fn list(store: &DocumentStore, limit: i64, offset: i64) -> Result<Vec<Catechumen>> {
    list_records(store, limit, offset).await
}

pub async fn count(store: &DocumentStore) -> Result<i64> {
    store.count(Catechumen::COLLECTION).await
}

/// Search by national id prefix and/or surname fragment
pub async fn search(
    store: &DocumentStore,
    cedula: Option<&str>,
    surname: Option<&str>,
) -> Result<Vec<Catechumen>> {
    let mut filter = Filter::new();
    if let Some(cedula) = search_term(cedula) {
        filter = filter.prefix("cedula", cedula);
    }
    if let Some(surname) = search_term(surname) {
        filter = filter.contains("primer_apellido", surname);
    }
    find_records(store, &filter).await
}

/// Overwrite a catechumen; the stored `_id` always wins over the body's
pub async fn update(store: &DocumentStore, id: &str, mut catechumen: Catechumen) -> Result<Catechumen> {
    catechumen.id = id.to_string();
    replace_record(store, &catechumen).await?;
    Ok(catechumen)
}

/// Apply a short contact/health edit, writing only the fields it touches
pub async fn update_contact(store: &DocumentStore, id: &str, update: &ContactUpdate) -> Result<Catechumen> {
    update.validate().into_result()?;

    let mut catechumen: Catechumen = get_record(store, id).await?;
    let touched = update.apply(&mut catechumen);
    if !touched.is_empty() {
        let set = select_fields(&catechumen, &touched)?;
        store.update_fields(Catechumen::COLLECTION, id, set).await?;
    }
    Ok(catechumen)
}

/// Delete a catechumen together with every enrollment that references it
pub async fn delete(store: &DocumentStore, id: &str) -> Result<()> {
    if !store.exists(Catechumen::COLLECTION, id).await? {
        return Err(Error::NotFound(format!("{} {}", Catechumen::COLLECTION, id)));
    }
    let removed = store
        .delete_where(
            Collection::Inscripciones,
            &Filter::new().eq("catequizando_id", id),
        )
        .await?;
    delete_record::<Catechumen>(store, id).await?;
    info!("Deleted catechumen {} and {} enrollment(s)", id, removed);
    Ok(())
}
