//! End-to-end tests of the `/api` router, driven in-process with `oneshot`.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use tutor_backend::storage::MemoryStore;
use tutor_backend::{create_router, AppConfig, AppState};

fn setup_test() -> Router {
    setup_with_config(AppConfig::default())
}

fn setup_with_config(config: AppConfig) -> Router {
    let store = Arc::new(MemoryStore::init_test());
    let state = AppState::new(store, &config).unwrap();
    create_router(state, &config.cors_origin)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
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
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn create_student(app: &Router, first: &str, currency: &str, parent: Value) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/students",
        Some(json!({
            "first_name": first,
            "last_name": "Tester",
            "grade": "10",
            "parent_contact": parent,
            "preferred_currency": currency
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["student"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_student_crud_roundtrip() {
    let app = setup_test();
    let id = create_student(&app, "Nomsa", "ZAR", json!({ "name": "Parent" })).await;

    let (status, student) = send(&app, Method::GET, &format!("/api/students/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(student["name"], "Nomsa Tester");
    assert_eq!(student["rates"]["online"], "250");

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/students/{}", id),
        Some(json!({ "last_name": "Khumalo" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["student"]["name"], "Nomsa Khumalo");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/students/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::DELETE, &format!("/api/students/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_student_validation_and_missing() {
    let app = setup_test();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/students",
        Some(json!({ "first_name": "", "last_name": "X", "grade": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/students/student::missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_student_pagination() {
    let app = setup_test();
    for name in ["Anele", "Busi", "Chloe"] {
        create_student(&app, name, "ZAR", json!({ "name": "Parent" })).await;
    }

    let (status, first_page) = send(&app, Method::GET, "/api/students?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first_page["items"].as_array().unwrap().len(), 2);
    assert_eq!(first_page["pagination"]["has_more"], true);

    let cursor = first_page["pagination"]["next_cursor"].as_str().unwrap();
    let (_, second_page) =
        send(&app, Method::GET, &format!("/api/students?limit=2&after={}", cursor), None).await;
    let items = second_page["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["first_name"], "Chloe");
    assert_eq!(second_page["pagination"]["has_more"], false);
}

#[tokio::test]
async fn test_invoice_generation_and_status_flow() {
    let app = setup_test();
    let id = create_student(&app, "Lily", "USD", json!({ "name": "Parent" })).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/attendance",
        Some(json!({
            "student_id": id,
            "date": "2024-09-02",
            "session_type": "online",
            "duration_hours": "2",
            "status": "present"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, invoice) = send(
        &app,
        Method::POST,
        "/api/invoices/generate",
        Some(json!({ "student_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", invoice);
    assert_eq!(invoice["amount"], "27.02");
    assert_eq!(invoice["currency"], "USD");
    assert_eq!(invoice["status"], "draft");
    let invoice_id = invoice["id"].as_str().unwrap().to_string();

    let status_uri = format!("/api/invoices/{}/status", invoice_id);
    let (status, _) = send(&app, Method::PUT, &status_uri, Some(json!({ "status": "overdue" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, sent) = send(&app, Method::PUT, &status_uri, Some(json!({ "status": "sent" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["status"], "sent");

    let (_, listed) = send(&app, Method::GET, &format!("/api/invoices?student_id={}", id), None).await;
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);

    let (status, overdue) = send(
        &app,
        Method::POST,
        "/api/invoices/mark-overdue?as_of=2099-01-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overdue["updated_invoice_ids"], json!([invoice_id]));

    let (_, report) = send(&app, Method::GET, "/api/reports/billing?currency=usd", None).await;
    assert_eq!(report["outstanding_invoice_count"], 1);
    assert_eq!(report["outstanding_total"], "27.02");
}

#[tokio::test]
async fn test_generate_without_sessions_is_rejected() {
    let app = setup_test();
    let id = create_student(&app, "Empty", "ZAR", json!({ "name": "Parent" })).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/invoices/generate",
        Some(json!({ "student_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("No billable sessions"));
}

#[tokio::test]
async fn test_currency_endpoints() {
    let app = setup_test();

    let (status, rates) = send(&app, Method::GET, "/api/currency/rates?currency=usd", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rates["currency"], "USD");
    assert_eq!(rates["rates"]["online"], "13.51");
    assert_eq!(rates["rates"]["in_person_one_on_one"], "18.92");

    let (status, _) = send(&app, Method::GET, "/api/currency/rates?currency=XYZ", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, converted) = send(
        &app,
        Method::POST,
        "/api/currency/convert",
        Some(json!({ "amount": "1850", "from": "ZAR", "to": "GBP" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(converted["converted"], "79.00");
    assert_eq!(converted["formatted"], "£79.00");

    let (status, verdict) = send(
        &app,
        Method::POST,
        "/api/currency/validate",
        Some(json!({ "amount": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["is_valid"], false);

    let (_, verdict) = send(
        &app,
        Method::POST,
        "/api/currency/validate",
        Some(json!({ "amount": 999999 })),
    )
    .await;
    assert_eq!(verdict["is_valid"], true);
}

#[tokio::test]
async fn test_auth_flow() {
    let app = setup_test();

    let (status, _) = send(&app, Method::GET, "/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        Some(json!({ "email": "nobody@example.com", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, profile) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        Some(json!({ "email": "admin@tutorhub.dev", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["role"], "admin");

    let (status, me) = send(&app, Method::GET, "/api/auth/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "admin@tutorhub.dev");

    let (status, _) = send(&app, Method::POST, "/api/auth/logout", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, "/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_records_and_summary() {
    let app = setup_test();
    let id = create_student(&app, "Reza", "AED", json!({ "name": "Parent" })).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/marks",
        Some(json!({ "student_id": id, "subject": "Chemistry", "term": "Term 1", "mark": 81.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/parent-logs",
        Some(json!({ "student_id": id, "date": "2024-09-03", "channel": "call", "summary": "Discussed exams" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["id"].as_str().unwrap().starts_with("parentLog::"));

    let (_, logs) = send(&app, Method::GET, &format!("/api/students/{}/parent-logs", id), None).await;
    assert_eq!(logs.as_array().unwrap().len(), 1);

    let (status, summary) = send(&app, Method::GET, &format!("/api/reports/students/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["currency"], "AED");
    assert_eq!(summary["average_mark"], 81.0);
}

#[tokio::test]
async fn test_send_invoice_without_contact() {
    let app = setup_test();
    let id = create_student(&app, "Silent", "ZAR", json!({ "name": "Parent" })).await;
    send(
        &app,
        Method::POST,
        "/api/attendance",
        Some(json!({
            "student_id": id,
            "date": "2024-09-02",
            "session_type": "in_person_class",
            "duration_hours": 1,
            "status": "late"
        })),
    )
    .await;
    let (_, invoice) = send(
        &app,
        Method::POST,
        "/api/invoices/generate",
        Some(json!({ "student_id": id })),
    )
    .await;
    let invoice_id = invoice["id"].as_str().unwrap();

    let (status, result) = send(&app, Method::POST, &format!("/api/invoices/{}/send", invoice_id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(result["success"], false);
    assert_eq!(result["platform"], Value::Null);

    let (status, _) = send(&app, Method::POST, "/api/invoices/invoice::nope/send", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_webhook_verification() {
    let mut config = AppConfig::default();
    config.messaging.whatsapp.verify_token = "hush".to_string();
    let app = setup_with_config(config);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/messaging/webhook?hub.mode=subscribe&hub.verify_token=hush&hub.challenge=8675309",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(8675309));

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/messaging/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, outcome) = send(
        &app,
        Method::POST,
        "/api/messaging/webhook",
        Some(json!({
            "entry": [{ "changes": [{ "value": { "statuses": [{ "id": "wamid.unknown", "status": "read" }] } }] }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome, json!({ "applied": 0, "skipped": 1 }));
}
