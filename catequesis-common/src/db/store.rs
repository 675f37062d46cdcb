//! Document store over SQLite
//!
//! Each collection is a table of `(_id, body)` rows where `body` is the whole
//! document in extended JSON. Partial updates run inside SQLite (`json_set`,
//! `json_insert`) so a write only replaces the fields it names and leaves any
//! other field of the row as the database currently holds it.

use serde_json::Value;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Arguments, Sqlite, SqliteConnection, SqlitePool};
use std::collections::VecDeque;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::collections::Collection;
use crate::db::document::{document_id, json_path_for_key, Document, ID_FIELD};
use crate::db::validation::{BsonType, ValidationLevel, Validator};
use crate::{Error, Result};

/// Rows fetched per round trip by [`DocumentCursor`]
const CURSOR_BATCH_SIZE: i64 = 100;

/// Handle to the document store (cheap to clone)
#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

/// A raw row as stored: id plus unparsed body
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub body: String,
}

impl StoredDocument {
    /// Parse the body; fails when the stored JSON is not an object
    pub fn parse(&self) -> Result<Document> {
        match serde_json::from_str::<Value>(&self.body)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Internal(format!(
                "Document {} is not an object: {}",
                self.id, other
            ))),
        }
    }
}

/// Condition on a top-level (or dotted) field
#[derive(Debug, Clone)]
enum Condition {
    Eq(String, Value),
    Contains(String, String),
    Prefix(String, String),
}

/// Conjunction of field conditions used by `find_where`/`count_where`/`delete_where`
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field equals value (strings, integers, floats, booleans, null)
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.to_string(), value.into()));
        self
    }

    /// Field contains text, ASCII case-insensitive
    pub fn contains(mut self, field: &str, text: &str) -> Self {
        self.conditions
            .push(Condition::Contains(field.to_string(), text.to_string()));
        self
    }

    /// Field starts with text
    pub fn prefix(mut self, field: &str, text: &str) -> Self {
        self.conditions
            .push(Condition::Prefix(field.to_string(), text.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// WHERE clause and its arguments
    fn to_sql<'q>(&self) -> Result<(String, SqliteArguments<'q>)> {
        let mut args = SqliteArguments::default();
        if self.conditions.is_empty() {
            return Ok(("1 = 1".to_string(), args));
        }

        let mut clauses = Vec::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            let (field, clause) = match condition {
                Condition::Eq(field, Value::Null) => (field, "json_extract(body, ?) IS NULL"),
                Condition::Eq(field, _) => (field, "json_extract(body, ?) = ?"),
                Condition::Contains(field, _) | Condition::Prefix(field, _) => {
                    (field, "json_extract(body, ?) LIKE ? ESCAPE '\\'")
                }
            };
            add_arg(&mut args, field_path(field)?)?;

            match condition {
                Condition::Eq(_, Value::Null) => {}
                Condition::Eq(_, Value::String(s)) => add_arg(&mut args, s.clone())?,
                Condition::Eq(_, Value::Bool(b)) => add_arg(&mut args, i64::from(*b))?,
                Condition::Eq(_, Value::Number(n)) => match n.as_i64() {
                    Some(i) => add_arg(&mut args, i)?,
                    None => add_arg(&mut args, n.as_f64().unwrap_or_default())?,
                },
                Condition::Eq(field, other) => {
                    return Err(Error::InvalidInput(format!(
                        "Cannot filter {} by a structured value: {}",
                        field, other
                    )))
                }
                Condition::Contains(_, text) => {
                    add_arg(&mut args, format!("%{}%", escape_like(text)))?
                }
                Condition::Prefix(_, text) => add_arg(&mut args, format!("{}%", escape_like(text)))?,
            }
            clauses.push(clause);
        }

        Ok((clauses.join(" AND "), args))
    }
}

fn add_arg<'q, T>(args: &mut SqliteArguments<'q>, value: T) -> Result<()>
where
    T: 'q + Send + sqlx::Encode<'q, Sqlite> + sqlx::Type<Sqlite>,
{
    args.add(value)
        .map_err(|e| Error::Internal(format!("Failed to bind query argument: {}", e)))
}

fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// JSON path for a dotted field name
fn field_path(field: &str) -> Result<String> {
    let mut path = String::from("$");
    for segment in field.split('.') {
        let quoted = json_path_for_key(segment)?;
        path.push_str(&quoted[1..]);
    }
    Ok(path)
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Fetch one document by `_id`
    pub async fn find_one(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        let body: Option<String> = sqlx::query_scalar(&format!(
            "SELECT body FROM {} WHERE _id = ?",
            collection.name()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        body.map(|body| StoredDocument { id: id.to_string(), body }.parse())
            .transpose()
    }

    /// Fetch one document by `_id`, `NotFound` when absent
    pub async fn get(&self, collection: Collection, id: &str) -> Result<Document> {
        self.find_one(collection, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("{} {}", collection, id)))
    }

    /// Whether a document with this `_id` exists
    pub async fn exists(&self, collection: Collection, id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE _id = ?)",
            collection.name()
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Every document, in `_id` order
    pub async fn find_all(&self, collection: Collection) -> Result<Vec<Document>> {
        self.find_where(collection, &Filter::new()).await
    }

    /// One page of documents in `_id` order
    pub async fn find_page(
        &self,
        collection: Collection,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Document>> {
        let rows: Vec<(String, String)> = sqlx::query_as(&format!(
            "SELECT _id, body FROM {} ORDER BY _id LIMIT ? OFFSET ?",
            collection.name()
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        parse_rows(rows)
    }

    /// Documents matching a filter, in `_id` order
    pub async fn find_where(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>> {
        let (clause, args) = filter.to_sql()?;
        let sql = format!(
            "SELECT _id, body FROM {} WHERE {} ORDER BY _id",
            collection.name(),
            clause
        );
        let rows: Vec<(String, String)> = sqlx::query_as_with(&sql, args)
            .fetch_all(&self.pool)
            .await?;

        parse_rows(rows)
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: Collection) -> Result<i64> {
        self.count_where(collection, &Filter::new()).await
    }

    /// Number of documents matching a filter
    pub async fn count_where(&self, collection: Collection, filter: &Filter) -> Result<i64> {
        let (clause, args) = filter.to_sql()?;
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {}", collection.name(), clause);
        let count: i64 = sqlx::query_scalar_with(&sql, args)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Sequential cursor over a whole collection
    pub fn cursor(&self, collection: Collection) -> DocumentCursor {
        DocumentCursor {
            store: self.clone(),
            collection,
            last_id: String::new(),
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Insert a document, generating `_id` when it is missing
    ///
    /// Returns the `_id` used. A primary key or unique index collision is
    /// reported as `Error::Duplicate`.
    pub async fn insert(&self, collection: Collection, mut document: Document) -> Result<String> {
        let id = match document_id(&document) {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            Some(_) => return Err(Error::field(ID_FIELD, "must not be empty")),
            None if document.contains_key(ID_FIELD) => {
                return Err(Error::field(ID_FIELD, "must be a string"))
            }
            None => {
                let id = Uuid::new_v4().simple().to_string();
                document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                id
            }
        };

        let mut conn = self.pool.acquire().await?;
        let (level, validator) = collection_settings(&mut conn, collection).await?;
        if level != ValidationLevel::Off {
            validator.validate(&document).into_result()?;
        }

        let body = serde_json::to_string(&document)?;
        sqlx::query(&format!(
            "INSERT INTO {} (_id, body) VALUES (?, ?)",
            collection.name()
        ))
        .bind(&id)
        .bind(body)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_write_error(collection, e))?;

        debug!("Inserted {} {}", collection, id);
        Ok(id)
    }

    /// Replace a whole document, keeping its `_id`
    pub async fn replace(&self, collection: Collection, id: &str, mut document: Document) -> Result<()> {
        document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));

        let mut conn = self.begin_write().await?;
        let result = replace_locked(&mut conn, collection, id, &document).await;
        finish_write(conn, result).await
    }

    /// Set top-level fields of one document (`$set` semantics)
    ///
    /// Only the named fields are written; the rest of the stored body is left
    /// exactly as the database holds it at write time. `_id` cannot be set.
    pub async fn update_fields(&self, collection: Collection, id: &str, set: Document) -> Result<()> {
        if set.is_empty() {
            return Ok(());
        }
        if set.contains_key(ID_FIELD) {
            return Err(Error::field(ID_FIELD, "is immutable"));
        }

        let mut conn = self.begin_write().await?;
        let result = update_fields_locked(&mut conn, collection, id, &set).await;
        finish_write(conn, result).await
    }

    /// Append one element to an embedded array, creating the array if absent
    pub async fn push(&self, collection: Collection, id: &str, array_field: &str, value: Value) -> Result<()> {
        if array_field == ID_FIELD {
            return Err(Error::field(ID_FIELD, "is immutable"));
        }
        let path = json_path_for_key(array_field)?;

        let mut conn = self.begin_write().await?;
        let result = push_locked(&mut conn, collection, id, array_field, &path, value).await;
        finish_write(conn, result).await
    }

    /// Connection inside a `BEGIN IMMEDIATE` transaction
    ///
    /// The write lock is held before the document is read, so concurrent
    /// read-modify-write calls queue on the busy timeout instead of failing.
    async fn begin_write(&self) -> Result<PoolConnection<Sqlite>> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(conn)
    }

    /// Delete one document; returns whether it existed
    pub async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        let affected = sqlx::query(&format!("DELETE FROM {} WHERE _id = ?", collection.name()))
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    /// Delete every document matching a filter; returns how many were removed
    pub async fn delete_where(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        if filter.is_empty() {
            return Err(Error::InvalidInput(
                "Refusing to delete with an empty filter".to_string(),
            ));
        }
        let (clause, args) = filter.to_sql()?;
        let sql = format!("DELETE FROM {} WHERE {}", collection.name(), clause);
        let affected = sqlx::query_with(&sql, args)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected)
    }

    // -------------------------------------------------------------------------
    // Collection settings
    // -------------------------------------------------------------------------

    /// Current validation level of a collection
    pub async fn validation_level(&self, collection: Collection) -> Result<ValidationLevel> {
        let mut conn = self.pool.acquire().await?;
        Ok(collection_settings(&mut conn, collection).await?.0)
    }

    /// Change the validation level of a collection
    pub async fn set_validation_level(&self, collection: Collection, level: ValidationLevel) -> Result<()> {
        let affected = sqlx::query(
            "UPDATE _collections SET validation_level = ?, updated_at = CURRENT_TIMESTAMP WHERE name = ?",
        )
        .bind(level.as_str())
        .bind(collection.name())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(Error::NotFound(format!("collection {}", collection)));
        }
        debug!("Validation level of {} set to {}", collection, level);
        Ok(())
    }

    /// Current validator of a collection
    pub async fn validator(&self, collection: Collection) -> Result<Validator> {
        let mut conn = self.pool.acquire().await?;
        Ok(collection_settings(&mut conn, collection).await?.1)
    }

    /// Replace the validator of a collection
    pub async fn set_validator(&self, collection: Collection, validator: &Validator) -> Result<()> {
        let affected = sqlx::query(
            "UPDATE _collections SET validator = ?, updated_at = CURRENT_TIMESTAMP WHERE name = ?",
        )
        .bind(serde_json::to_string(validator)?)
        .bind(collection.name())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(Error::NotFound(format!("collection {}", collection)));
        }
        Ok(())
    }

    /// Redeclare the type of one path in a collection's validator
    pub async fn set_field_type(&self, collection: Collection, path: &str, bson_type: BsonType) -> Result<()> {
        let mut validator = self.validator(collection).await?;
        validator.set_field_type(path, bson_type);
        self.set_validator(collection, &validator).await
    }
}

/// Sequential, restartable walk over a collection in `_id` order
///
/// Rows are fetched in small keyset batches, so documents updated while the
/// cursor is open are neither skipped nor revisited.
#[derive(Debug)]
pub struct DocumentCursor {
    store: DocumentStore,
    collection: Collection,
    last_id: String,
    buffer: VecDeque<StoredDocument>,
    exhausted: bool,
}

impl DocumentCursor {
    /// Next stored document, `None` once the collection is exhausted
    pub async fn next(&mut self) -> Result<Option<StoredDocument>> {
        if self.buffer.is_empty() && !self.exhausted {
            self.fill().await?;
        }
        Ok(self.buffer.pop_front())
    }

    async fn fill(&mut self) -> Result<()> {
        let rows: Vec<(String, String)> = sqlx::query_as(&format!(
            "SELECT _id, body FROM {} WHERE _id > ? ORDER BY _id LIMIT ?",
            self.collection.name()
        ))
        .bind(&self.last_id)
        .bind(CURSOR_BATCH_SIZE)
        .fetch_all(self.store.pool())
        .await?;

        if (rows.len() as i64) < CURSOR_BATCH_SIZE {
            self.exhausted = true;
        }
        if let Some((id, _)) = rows.last() {
            self.last_id = id.clone();
        }
        self.buffer
            .extend(rows.into_iter().map(|(id, body)| StoredDocument { id, body }));
        Ok(())
    }
}

fn parse_rows(rows: Vec<(String, String)>) -> Result<Vec<Document>> {
    rows.into_iter()
        .map(|(id, body)| StoredDocument { id, body }.parse())
        .collect()
}

/// Commit on success, roll back otherwise
async fn finish_write<T>(mut conn: PoolConnection<Sqlite>, result: Result<T>) -> Result<T> {
    let outcome = match result {
        Ok(value) => sqlx::query("COMMIT")
            .execute(&mut *conn)
            .await
            .map(|_| value)
            .map_err(Error::from),
        Err(e) => Err(e),
    };

    if outcome.is_err() {
        if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
            // Never hand a connection with an open transaction back to the pool
            warn!("Rollback failed, discarding connection: {}", e);
            drop(conn.detach());
        }
    }
    outcome
}

async fn replace_locked(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &str,
    document: &Document,
) -> Result<()> {
    let existing = fetch_document(conn, collection, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{} {}", collection, id)))?;
    check_update(conn, collection, &existing, document).await?;

    let body = serde_json::to_string(document)?;
    sqlx::query(&format!("UPDATE {} SET body = ? WHERE _id = ?", collection.name()))
        .bind(body)
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_write_error(collection, e))?;
    Ok(())
}

async fn update_fields_locked(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &str,
    set: &Document,
) -> Result<()> {
    let existing = fetch_document(conn, collection, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{} {}", collection, id)))?;

    let mut merged = existing.clone();
    for (key, value) in set {
        merged.insert(key.clone(), value.clone());
    }
    check_update(conn, collection, &existing, &merged).await?;

    let mut args = SqliteArguments::default();
    let mut placeholders = Vec::with_capacity(set.len());
    for (key, value) in set {
        add_arg(&mut args, json_path_for_key(key)?)?;
        add_arg(&mut args, serde_json::to_string(value)?)?;
        placeholders.push("?, json(?)");
    }
    add_arg(&mut args, id.to_string())?;

    let sql = format!(
        "UPDATE {} SET body = json_set(body, {}) WHERE _id = ?",
        collection.name(),
        placeholders.join(", ")
    );
    sqlx::query_with(&sql, args)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_write_error(collection, e))?;
    Ok(())
}

async fn push_locked(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &str,
    array_field: &str,
    path: &str,
    value: Value,
) -> Result<()> {
    let existing = fetch_document(conn, collection, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{} {}", collection, id)))?;

    let mut merged = existing.clone();
    match merged.get_mut(array_field) {
        Some(Value::Array(items)) => items.push(value.clone()),
        Some(other) => {
            return Err(Error::field(
                array_field,
                format!("is not an array ({})", other),
            ))
        }
        None => {
            merged.insert(array_field.to_string(), Value::Array(vec![value.clone()]));
        }
    }
    check_update(conn, collection, &existing, &merged).await?;

    let encoded = serde_json::to_string(&value)?;
    let sql = format!(
        r#"
        UPDATE {} SET body = CASE
            WHEN json_type(body, ?1) = 'array' THEN json_insert(body, ?1 || '[#]', json(?2))
            ELSE json_set(body, ?1, json_array(json(?2)))
        END
        WHERE _id = ?3
        "#,
        collection.name()
    );
    sqlx::query(&sql)
        .bind(path)
        .bind(encoded)
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_write_error(collection, e))?;
    Ok(())
}

async fn fetch_document(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &str,
) -> Result<Option<Document>> {
    let body: Option<String> = sqlx::query_scalar(&format!(
        "SELECT body FROM {} WHERE _id = ?",
        collection.name()
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    body.map(|body| StoredDocument { id: id.to_string(), body }.parse())
        .transpose()
}

async fn collection_settings(
    conn: &mut SqliteConnection,
    collection: Collection,
) -> Result<(ValidationLevel, Validator)> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT validation_level, validator FROM _collections WHERE name = ?")
            .bind(collection.name())
            .fetch_optional(&mut *conn)
            .await?;

    let (level, validator) =
        row.ok_or_else(|| Error::NotFound(format!("collection {}", collection)))?;
    Ok((level.parse()?, serde_json::from_str(&validator)?))
}

/// Apply the collection's validation level to an update
async fn check_update(
    conn: &mut SqliteConnection,
    collection: Collection,
    existing: &Document,
    updated: &Document,
) -> Result<()> {
    let (level, validator) = collection_settings(conn, collection).await?;
    match level {
        ValidationLevel::Off => Ok(()),
        ValidationLevel::Strict => validator.validate(updated).into_result(),
        ValidationLevel::Moderate => {
            if validator.validate(existing).is_empty() {
                validator.validate(updated).into_result()
            } else {
                Ok(())
            }
        }
    }
}

fn map_write_error(collection: Collection, error: sqlx::Error) -> Error {
    match error {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Error::Duplicate(format!("{}: {}", collection, db_err.message()))
        }
        other => Error::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_store;
    use serde_json::json;
    use tempfile::TempDir;

    async fn setup_store() -> (TempDir, DocumentStore) {
        let dir = TempDir::new().unwrap();
        let store = init_store(&dir.path().join("test.db")).await.unwrap();
        (dir, store)
    }

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn nivel(id: &str, nombre: &str) -> Document {
        doc(json!({
            "_id": id,
            "nombre": nombre,
            "libro_asignado": "Libro de Iniciación",
            "edad_minima": 7
        }))
    }

    #[tokio::test]
    async fn test_insert_and_find_one() {
        let (_dir, store) = setup_store().await;
        let id = store.insert(Collection::Niveles, nivel("1", "Iniciación")).await.unwrap();
        assert_eq!(id, "1");

        let found = store.find_one(Collection::Niveles, "1").await.unwrap().unwrap();
        assert_eq!(found["nombre"], "Iniciación");
        assert!(store.find_one(Collection::Niveles, "2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_id_rejected() {
        let (_dir, store) = setup_store().await;
        store.insert(Collection::Niveles, nivel("1", "Iniciación")).await.unwrap();

        let result = store.insert(Collection::Niveles, nivel("1", "Otra")).await;
        assert!(matches!(result, Err(Error::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_insert_generates_id() {
        let (_dir, store) = setup_store().await;
        let mut d = nivel("x", "Confirmación");
        d.remove("_id");

        let id = store.insert(Collection::Niveles, d).await.unwrap();
        assert_eq!(id.len(), 32);
        let found = store.get(Collection::Niveles, &id).await.unwrap();
        assert_eq!(found["_id"], json!(id));
    }

    #[tokio::test]
    async fn test_strict_validation_rejects_insert() {
        let (_dir, store) = setup_store().await;
        let mut d = nivel("1", "Iniciación");
        d.insert("edad_minima".to_string(), json!("siete"));

        let result = store.insert(Collection::Niveles, d.clone()).await;
        assert!(matches!(result, Err(Error::Validation(_))));

        store
            .set_validation_level(Collection::Niveles, ValidationLevel::Off)
            .await
            .unwrap();
        store.insert(Collection::Niveles, d).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_fields_only_touches_named_fields() {
        let (_dir, store) = setup_store().await;
        store.insert(Collection::Niveles, nivel("1", "Iniciación")).await.unwrap();

        let set = doc(json!({"descripcion": "Primer año"}));
        store.update_fields(Collection::Niveles, "1", set).await.unwrap();

        let found = store.get(Collection::Niveles, "1").await.unwrap();
        assert_eq!(found["descripcion"], "Primer año");
        assert_eq!(found["nombre"], "Iniciación");
        assert_eq!(found["edad_minima"], 7);
    }

    #[tokio::test]
    async fn test_update_fields_rejects_id_and_missing_doc() {
        let (_dir, store) = setup_store().await;
        store.insert(Collection::Niveles, nivel("1", "Iniciación")).await.unwrap();

        let result = store
            .update_fields(Collection::Niveles, "1", doc(json!({"_id": "2"})))
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));

        let result = store
            .update_fields(Collection::Niveles, "9", doc(json!({"nombre": "x"})))
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_moderate_skips_already_invalid_documents() {
        let (_dir, store) = setup_store().await;
        store
            .set_validation_level(Collection::Niveles, ValidationLevel::Off)
            .await
            .unwrap();
        let mut invalid = nivel("1", "Iniciación");
        invalid.insert("edad_minima".to_string(), json!("siete"));
        store.insert(Collection::Niveles, invalid).await.unwrap();
        store.insert(Collection::Niveles, nivel("2", "Comunión")).await.unwrap();

        store
            .set_validation_level(Collection::Niveles, ValidationLevel::Moderate)
            .await
            .unwrap();

        // Already invalid: update allowed
        store
            .update_fields(Collection::Niveles, "1", doc(json!({"libro_asignado": 3})))
            .await
            .unwrap();

        // Valid document: update validated
        let result = store
            .update_fields(Collection::Niveles, "2", doc(json!({"libro_asignado": 3})))
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_push_appends_and_creates_array() {
        let (_dir, store) = setup_store().await;
        store.insert(Collection::Niveles, nivel("1", "Iniciación")).await.unwrap();

        store
            .push(Collection::Niveles, "1", "notas", json!({"texto": "uno"}))
            .await
            .unwrap();
        store
            .push(Collection::Niveles, "1", "notas", json!({"texto": "dos"}))
            .await
            .unwrap();

        let found = store.get(Collection::Niveles, "1").await.unwrap();
        assert_eq!(found["notas"], json!([{"texto": "uno"}, {"texto": "dos"}]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pushes_all_land() {
        let (_dir, store) = setup_store().await;
        store.insert(Collection::Niveles, nivel("1", "Iniciación")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..40 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.push(Collection::Niveles, "1", "notas", json!(i)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let found = store.get(Collection::Niveles, "1").await.unwrap();
        let mut notes: Vec<i64> = found["notas"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect();
        notes.sort();
        assert_eq!(notes, (0..40).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_field_updates_do_not_fail() {
        let (_dir, store) = setup_store().await;
        store.insert(Collection::Niveles, nivel("1", "Iniciación")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut set = Document::new();
                set.insert(format!("campo_{}", i), json!(i));
                store.update_fields(Collection::Niveles, "1", set).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let found = store.get(Collection::Niveles, "1").await.unwrap();
        assert!((0..20).all(|i| found[&format!("campo_{}", i)] == json!(i)));
    }

    #[tokio::test]
    async fn test_failed_write_releases_the_lock() {
        let (_dir, store) = setup_store().await;
        store.insert(Collection::Niveles, nivel("1", "Iniciación")).await.unwrap();

        let result = store
            .push(Collection::Niveles, "1", "nombre", json!("x"))
            .await;
        assert!(result.is_err());

        // A rolled-back write leaves the store writable
        store
            .push(Collection::Niveles, "1", "notas", json!("ok"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_filter_eq_contains_prefix() {
        let (_dir, store) = setup_store().await;
        store.insert(Collection::Niveles, nivel("1", "Iniciación")).await.unwrap();
        store.insert(Collection::Niveles, nivel("2", "Comunión")).await.unwrap();
        store.insert(Collection::Niveles, nivel("3", "Confirmación")).await.unwrap();

        let found = store
            .find_where(Collection::Niveles, &Filter::new().prefix("nombre", "Co"))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let found = store
            .find_where(Collection::Niveles, &Filter::new().contains("nombre", "MUNI"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let count = store
            .count_where(Collection::Niveles, &Filter::new().eq("edad_minima", 7))
            .await
            .unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_like_wildcards_are_literal() {
        let (_dir, store) = setup_store().await;
        store.insert(Collection::Niveles, nivel("1", "100% Fe")).await.unwrap();
        store.insert(Collection::Niveles, nivel("2", "1000 Fe")).await.unwrap();

        let found = store
            .find_where(Collection::Niveles, &Filter::new().contains("nombre", "0%"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_cursor_walks_every_document_once() {
        let (_dir, store) = setup_store().await;
        for i in 0..250 {
            store
                .insert(Collection::Niveles, nivel(&format!("{:04}", i), "Nivel"))
                .await
                .unwrap();
        }

        let mut cursor = store.cursor(Collection::Niveles);
        let mut seen = 0;
        while let Some(stored) = cursor.next().await.unwrap() {
            // Writing while the cursor is open must not disturb it
            store
                .update_fields(Collection::Niveles, &stored.id, doc(json!({"visto": true})))
                .await
                .unwrap();
            seen += 1;
        }
        assert_eq!(seen, 250);
    }

    #[tokio::test]
    async fn test_delete_where_requires_filter() {
        let (_dir, store) = setup_store().await;
        store.insert(Collection::Niveles, nivel("1", "Iniciación")).await.unwrap();

        assert!(store.delete_where(Collection::Niveles, &Filter::new()).await.is_err());
        let removed = store
            .delete_where(Collection::Niveles, &Filter::new().eq("nombre", "Iniciación"))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(!store.delete(Collection::Niveles, "1").await.unwrap());
    }
}
