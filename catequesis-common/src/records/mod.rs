//! Record operations
//!
//! Typed create/read/update/delete for each collection on top of the
//! [`DocumentStore`]. Model rules are checked here before anything is written;
//! the collection validator and unique index are checked by the store.

pub mod catechumens;
pub mod cycles;
pub mod enrollments;
pub mod groups;
pub mod levels;

use tracing::warn;

use crate::db::{document_id, from_document, to_document, Document, DocumentStore, Filter};
use crate::models::Record;
use crate::{Error, Result};

/// Validate and insert a new record
pub async fn insert_record<R: Record>(store: &DocumentStore, record: &R) -> Result<String> {
    record.validate().into_result()?;
    store.insert(R::COLLECTION, to_document(record)?).await
}

/// Validate and overwrite an existing record
pub async fn replace_record<R: Record>(store: &DocumentStore, record: &R) -> Result<()> {
    record.validate().into_result()?;
    store
        .replace(R::COLLECTION, record.id(), to_document(record)?)
        .await
}

/// Load one record, `NotFound` when absent
pub async fn get_record<R: Record>(store: &DocumentStore, id: &str) -> Result<R> {
    from_document(store.get(R::COLLECTION, id).await?)
}

/// Load one record if it exists
pub async fn find_record<R: Record>(store: &DocumentStore, id: &str) -> Result<Option<R>> {
    store
        .find_one(R::COLLECTION, id)
        .await?
        .map(from_document)
        .transpose()
}

/// One page of records in `_id` order
pub async fn list_records<R: Record>(store: &DocumentStore, limit: i64, offset: i64) -> Result<Vec<R>> {
    decode_all(store.find_page(R::COLLECTION, limit, offset).await?)
}

/// Records matching a filter, in `_id` order
pub async fn find_records<R: Record>(store: &DocumentStore, filter: &Filter) -> Result<Vec<R>> {
    decode_all(store.find_where(R::COLLECTION, filter).await?)
}

/// Delete one record, `NotFound` when absent
pub async fn delete_record<R: Record>(store: &DocumentStore, id: &str) -> Result<()> {
    if store.delete(R::COLLECTION, id).await? {
        Ok(())
    } else {
        Err(Error::NotFound(format!("{} {}", R::COLLECTION, id)))
    }
}

/// Decode a listing; a document that does not fit the model is logged and left out
fn decode_all<R: Record>(documents: Vec<Document>) -> Result<Vec<R>> {
    let mut records = Vec::with_capacity(documents.len());
    for document in documents {
        let id = document_id(&document).unwrap_or_default().to_string();
        match from_document(document) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping unreadable {} {}: {}", R::COLLECTION, id, e),
        }
    }
    Ok(records)
}

/// Top-level fields of a serialized record, for a scoped update
pub(crate) fn select_fields<R: Record>(record: &R, fields: &[&str]) -> Result<Document> {
    let mut document = to_document(record)?;
    let mut set = Document::new();
    for field in fields {
        if let Some(value) = document.remove(*field) {
            set.insert(field.to_string(), value);
        }
    }
    Ok(set)
}

/// Normalized optional search term: blank means "no filter"
pub(crate) fn search_term(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
