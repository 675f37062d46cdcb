//! Integration tests for the catequesis-web endpoints
//!
//! Each test runs the router against a fresh store in a temporary directory.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use catequesis_common::db::init_store;
use catequesis_web::{build_router, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

/// Test helper: app over an empty store (the TempDir must outlive the app)
async fn setup_app() -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let store = init_store(&dir.path().join("test.db")).await.unwrap();
    (dir, build_router(AppState::new(store)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, json)
}

fn catechumen(id: &str, cedula: &str, surname: &str) -> Value {
    json!({
        "_id": id,
        "cedula": cedula,
        "primer_nombre": "Ana",
        "primer_apellido": surname,
        "genero": "F",
        "fecha_nacimiento": "2014-02-03",
        "direccion": "Av. Solano 1-23",
        "representante_legal": {"es_uno_de_los_padres": true, "nombres": "Rosa", "apellidos": "Vega"},
        "fe_bautismo": {"fecha": "2014-06-12", "parroquia": "San José"}
    })
}

/// Level "1", cycle "2024", catechumen "1" and active group "g1"
async fn seed(app: &Router) {
    let (status, _) = send(
        app,
        "POST",
        "/api/niveles",
        Some(json!({"_id": "1", "nombre": "Primera Comunión", "libro_asignado": "Jesús es mi amigo", "edad_minima": 8})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        app,
        "POST",
        "/api/ciclos",
        Some(json!({"_id": "2024", "nombre": "Ciclo 2024-2025", "fecha_inicio": "2024-09-01T00:00:00Z", "fecha_fin": "2025-06-30T00:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(app, "POST", "/api/catequizandos", Some(catechumen("1", "0102030405", "Torres"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        app,
        "POST",
        "/api/grupos",
        Some(json!({"_id": "g1", "nombre_grupo": "Comunión A", "ciclo_id": "2024", "nivel_id": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, app) = setup_app().await;
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "catequesis-web");
    assert!(body["version"].is_string());
    assert_eq!(body["database"], "ok");
    assert_eq!(body["collections"]["catequizandos"], 0);

    seed(&app).await;
    let (_, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(body["collections"]["catequizandos"], 1);
    assert_eq!(body["collections"]["grupos"], 1);
    assert_eq!(body["collections"]["inscripciones"], 0);
}

#[tokio::test]
async fn test_health_reports_unreachable_store() {
    let dir = TempDir::new().unwrap();
    let store = init_store(&dir.path().join("test.db")).await.unwrap();
    let app = build_router(AppState::new(store.clone()));
    store.pool().close().await;

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_ne!(body["database"], "ok");
    assert_eq!(body["collections"], json!({}));
}

// =============================================================================
// Catechumens
// =============================================================================

#[tokio::test]
async fn test_create_and_get_catechumen() {
    let (_dir, app) = setup_app().await;
    let (status, _) = send(&app, "POST", "/api/catequizandos", Some(catechumen("1", "0102030405", "Torres"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "GET", "/api/catequizandos/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["primer_apellido"], "Torres");
    // Embedded dates come back as plain strings
    assert_eq!(body["fe_bautismo"]["fecha"], "2014-06-12");
}

#[tokio::test]
async fn test_invalid_catechumen_returns_field_errors() {
    let (_dir, app) = setup_app().await;
    let (status, body) = send(&app, "POST", "/api/catequizandos", Some(catechumen("1", "123", "Torres"))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["cedula"].is_array());

    let (status, _) = send(&app, "GET", "/api/catequizandos/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_catechumen_id_conflicts() {
    let (_dir, app) = setup_app().await;
    send(&app, "POST", "/api/catequizandos", Some(catechumen("1", "0102030405", "Torres"))).await;
    let (status, _) = send(&app, "POST", "/api/catequizandos", Some(catechumen("1", "0607080910", "Vega"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_catechumen_listing_and_search() {
    let (_dir, app) = setup_app().await;
    send(&app, "POST", "/api/catequizandos", Some(catechumen("1", "0102030405", "Torres"))).await;
    send(&app, "POST", "/api/catequizandos", Some(catechumen("2", "0199999999", "Vega"))).await;
    send(&app, "POST", "/api/catequizandos", Some(catechumen("3", "0602030405", "Torresano"))).await;

    let (status, body) = send(&app, "GET", "/api/catequizandos?page=7", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 100);
    assert_eq!(body["items"].as_array().unwrap().len(), 3);

    let (_, found) = send(&app, "GET", "/api/catequizandos/buscar?apellido=torres", None).await;
    let ids: Vec<&str> = found.as_array().unwrap().iter().map(|c| c["_id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["1", "3"]);

    let (_, found) = send(&app, "GET", "/api/catequizandos/buscar?cedula=01", None).await;
    assert_eq!(found.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_contact_patch_changes_only_given_fields() {
    let (_dir, app) = setup_app().await;
    send(&app, "POST", "/api/catequizandos", Some(catechumen("1", "0102030405", "Torres"))).await;

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/catequizandos/1",
        Some(json!({"telefono": "0991234567", "correo": "rosa@example.com", "alergia": "Polen"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["telefono_casa"], "0991234567");
    assert_eq!(body["representante_legal"]["correo"], "rosa@example.com");
    assert_eq!(body["informacion_salud"]["alergias"], json!(["Polen"]));

    let (_, stored) = send(&app, "GET", "/api/catequizandos/1", None).await;
    assert_eq!(stored["telefono_casa"], "0991234567");
    assert_eq!(stored["primer_apellido"], "Torres");
    assert_eq!(stored["fe_bautismo"]["fecha"], "2014-06-12");
}

#[tokio::test]
async fn test_put_keeps_path_id() {
    let (_dir, app) = setup_app().await;
    send(&app, "POST", "/api/catequizandos", Some(catechumen("1", "0102030405", "Torres"))).await;

    let (status, body) = send(&app, "PUT", "/api/catequizandos/1", Some(catechumen("other", "0102030405", "Torres Vega"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["_id"], "1");

    let (status, _) = send(&app, "GET", "/api/catequizandos/other", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Levels, cycles, groups
// =============================================================================

#[tokio::test]
async fn test_level_minimum_age_is_bounded() {
    let (_dir, app) = setup_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/niveles",
        Some(json!({"_id": "1", "nombre": "Confirmación", "libro_asignado": "Libro", "edad_minima": 19})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["edad_minima"].is_array());
}

#[tokio::test]
async fn test_cycle_end_must_follow_start() {
    let (_dir, app) = setup_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/ciclos",
        Some(json!({"_id": "2024", "nombre": "Ciclo", "fecha_inicio": "2025-06-30", "fecha_fin": "2024-09-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["fecha_fin"].is_array());
}

#[tokio::test]
async fn test_referenced_level_and_cycle_cannot_be_deleted() {
    let (_dir, app) = setup_app().await;
    seed(&app).await;

    let (status, _) = send(&app, "DELETE", "/api/niveles/1", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&app, "DELETE", "/api/ciclos/2024", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "DELETE", "/api/grupos/g1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", "/api/niveles/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_group_update_and_search() {
    let (_dir, app) = setup_app().await;
    seed(&app).await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/grupos/g1",
        Some(json!({"nombre_grupo": "Comunión B", "estado": "INACTIVO"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nombre_grupo"], "Comunión B");
    assert_eq!(body["ciclo_id"], "2024");

    let (_, found) = send(&app, "GET", "/api/grupos/buscar?estado=INACTIVO&ciclo_id=2024", None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    let (_, found) = send(&app, "GET", "/api/grupos/buscar?estado=ACTIVO", None).await;
    assert!(found.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_group_with_unknown_cycle_is_rejected() {
    let (_dir, app) = setup_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/grupos",
        Some(json!({"nombre_grupo": "Comunión A", "ciclo_id": "nope", "nivel_id": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["ciclo_id"].is_array());
    assert!(body["fields"]["nivel_id"].is_array());
}

// =============================================================================
// Enrollments
// =============================================================================

#[tokio::test]
async fn test_enrollment_pair_is_unique() {
    let (_dir, app) = setup_app().await;
    seed(&app).await;
    let request = json!({"catequizando_id": "1", "grupo_id": "g1"});

    let (status, body) = send(&app, "POST", "/api/inscripciones", Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["estado_inscripcion"], "CURSANDO");
    assert_eq!(body["estado_pago"], "PENDIENTE");

    let (status, _) = send(&app, "POST", "/api/inscripciones", Some(request)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, page) = send(&app, "GET", "/api/inscripciones", None).await;
    assert_eq!(page["total"], 1);
}

#[tokio::test]
async fn test_attendance_and_grades_append() {
    let (_dir, app) = setup_app().await;
    seed(&app).await;
    send(&app, "POST", "/api/inscripciones", Some(json!({"catequizando_id": "1", "grupo_id": "g1"}))).await;

    let uri = "/api/inscripciones/1/g1/asistencia";
    send(&app, "POST", uri, Some(json!({"sesion_id": 1}))).await;
    let (status, body) = send(&app, "POST", uri, Some(json!({"sesion_id": 2, "estado": "FALTA"}))).await;
    assert_eq!(status, StatusCode::OK);
    let attendance = body["registro_asistencia"].as_array().unwrap();
    assert_eq!(attendance.len(), 2);
    assert_eq!(attendance[0]["estado"], "PRESENTE");
    assert_eq!(attendance[1]["estado"], "FALTA");
    assert!(attendance[1]["fecha"].is_string());

    let uri = "/api/inscripciones/1/g1/nota";
    let (status, body) = send(&app, "POST", uri, Some(json!({"descripcion": "Parcial 1", "valor": 9.5}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calificaciones"][0]["valor"], 9.5);

    let (status, body) = send(&app, "POST", uri, Some(json!({"descripcion": "Parcial 2", "valor": 11}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["valor"].is_array());

    let (_, stored) = send(&app, "GET", "/api/inscripciones/1/g1", None).await;
    assert_eq!(stored["calificaciones"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_enrollment_status_update_and_search() {
    let (_dir, app) = setup_app().await;
    seed(&app).await;
    send(&app, "POST", "/api/inscripciones", Some(json!({"catequizando_id": "1", "grupo_id": "g1"}))).await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/inscripciones/1/g1",
        Some(json!({"estado_inscripcion": "APROBADO", "estado_pago": "PAGADO"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["estado_inscripcion"], "APROBADO");

    let (_, found) = send(&app, "GET", "/api/inscripciones/buscar?estado=APROBADO&grupo_id=g1", None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    let (_, found) = send(&app, "GET", "/api/inscripciones/buscar?estado=RETIRADO", None).await;
    assert!(found.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_deleting_catechumen_removes_enrollments() {
    let (_dir, app) = setup_app().await;
    seed(&app).await;
    send(&app, "POST", "/api/inscripciones", Some(json!({"catequizando_id": "1", "grupo_id": "g1"}))).await;

    let (status, _) = send(&app, "DELETE", "/api/catequizandos/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/api/inscripciones/1/g1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", "/api/catequizandos/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_enrolling_in_inactive_group_is_rejected() {
    let (_dir, app) = setup_app().await;
    seed(&app).await;
    send(&app, "PUT", "/api/grupos/g1", Some(json!({"nombre_grupo": "Comunión A", "estado": "INACTIVO"}))).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/inscripciones",
        Some(json!({"catequizando_id": "1", "grupo_id": "g1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["grupo_id"].is_array());
}
