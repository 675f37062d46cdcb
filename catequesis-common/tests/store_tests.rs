//! Document store behavior on a freshly initialized database

use catequesis_common::config::StoreConfig;
use catequesis_common::db::{open_store, Collection, Document, Filter, ValidationLevel};
use catequesis_common::Error;
use serde_json::{json, Value};
use tempfile::TempDir;

fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

fn enrollment(catequizando_id: &str, grupo_id: &str) -> Document {
    doc(json!({
        "catequizando_id": catequizando_id,
        "grupo_id": grupo_id,
        "fecha_inscripcion": {"$date": "2024-09-02T15:00:00.000Z"},
        "estado_inscripcion": "CURSANDO",
        "estado_pago": "PENDIENTE"
    }))
}

#[tokio::test]
async fn test_open_store_creates_file_under_host_dir() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::in_dir(&dir.path().join("data"), "parroquia");

    let store = open_store(&config).await.unwrap();
    assert!(dir.path().join("data").join("parroquia.db").exists());
    assert_eq!(store.count(Collection::Catequizandos).await.unwrap(), 0);
}

#[tokio::test]
async fn test_enrollment_pair_unique_even_without_validation() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&StoreConfig::in_dir(dir.path(), "catequesis_db"))
        .await
        .unwrap();
    store
        .set_validation_level(Collection::Inscripciones, ValidationLevel::Off)
        .await
        .unwrap();

    store.insert(Collection::Inscripciones, enrollment("1", "g1")).await.unwrap();
    store.insert(Collection::Inscripciones, enrollment("1", "g2")).await.unwrap();
    store.insert(Collection::Inscripciones, enrollment("2", "g1")).await.unwrap();

    let duplicate = store.insert(Collection::Inscripciones, enrollment("1", "g1")).await;
    assert!(matches!(duplicate, Err(Error::Duplicate(_))));

    let count = store
        .count_where(
            Collection::Inscripciones,
            &Filter::new().eq("catequizando_id", "1").eq("grupo_id", "g1"),
        )
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_strict_rejects_string_where_date_declared() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&StoreConfig::in_dir(dir.path(), "catequesis_db"))
        .await
        .unwrap();

    let mut bad = enrollment("1", "g1");
    bad.insert("fecha_inscripcion".to_string(), json!("2024-09-02"));

    match store.insert(Collection::Inscripciones, bad).await {
        Err(Error::Validation(errors)) => assert!(errors.contains("fecha_inscripcion")),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(store.count(Collection::Inscripciones).await.unwrap(), 0);
}

#[tokio::test]
async fn test_find_page_walks_in_id_order() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&StoreConfig::in_dir(dir.path(), "catequesis_db"))
        .await
        .unwrap();
    for id in ["3", "1", "2"] {
        store
            .insert(
                Collection::Niveles,
                doc(json!({"_id": id, "nombre": "Nivel", "libro_asignado": "Libro", "edad_minima": 7})),
            )
            .await
            .unwrap();
    }

    let first = store.find_page(Collection::Niveles, 2, 0).await.unwrap();
    let second = store.find_page(Collection::Niveles, 2, 2).await.unwrap();
    assert_eq!(first[0]["_id"], "1");
    assert_eq!(first[1]["_id"], "2");
    assert_eq!(second.len(), 1);
    assert_eq!(second[0]["_id"], "3");
}
