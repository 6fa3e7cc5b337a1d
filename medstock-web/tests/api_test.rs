//! Users, catalog and ledger endpoints

mod helpers;

use axum::http::{header, StatusCode};
use helpers::{extract_json, TestApp, ADMIN, NURSE};
use serde_json::{json, Value};

async fn create_gauze(app: &TestApp, cookie: &str, quantity: i64, min_stock: i64) -> i64 {
    let response = app
        .post(
            "/api/items",
            Some(cookie),
            json!({
                "name": "Gauze 10x10",
                "category": "Dressings",
                "unit": "pack",
                "quantity": quantity,
                "min_stock": min_stock,
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response).await["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_check_is_public() {
    let app = TestApp::spawn().await;
    let response = app.get("/api/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn protected_routes_require_session() {
    let app = TestApp::spawn().await;

    for uri in [
        "/api/items",
        "/api/items/low-stock",
        "/api/items/1",
        "/api/transactions",
        "/api/users",
    ] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(extract_json(response).await["error"], "unauthenticated");
    }

    let response = app
        .post(
            "/api/transactions",
            None,
            json!({ "item_id": 1, "type": "out", "quantity": 1 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_administration_requires_admin() {
    let app = TestApp::spawn().await;
    let nurse = app.login(NURSE.0, NURSE.1).await;

    let response = app.get("/api/users", Some(&nurse)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post(
            "/api/users",
            Some(&nurse),
            json!({ "name": "intruder", "password": "letmein1", "role": "admin" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(extract_json(response).await["error"], "forbidden");

    let admin = app.login(ADMIN.0, ADMIN.1).await;
    let users = extract_json(app.get("/api/users", Some(&admin)).await).await;
    let names: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|u| u["name"].as_str())
        .collect();
    assert!(!names.contains(&"intruder"));
}

#[tokio::test]
async fn admin_creates_users() {
    let app = TestApp::spawn().await;
    let admin = app.login(ADMIN.0, ADMIN.1).await;

    let response = app
        .post(
            "/api/users",
            Some(&admin),
            json!({ "name": "pharmacist", "password": "dispense-42" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = extract_json(response).await;
    assert_eq!(body["name"], "pharmacist");
    assert_eq!(body["role"], "user");
    assert!(body.get("password_hash").is_none());

    let duplicate = app
        .post(
            "/api/users",
            Some(&admin),
            json!({ "name": "pharmacist", "password": "another-pass" }),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let short = app
        .post(
            "/api/users",
            Some(&admin),
            json!({ "name": "intern", "password": "12345" }),
        )
        .await;
    assert_eq!(short.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        extract_json(short).await["message"],
        "Password must be at least 6 characters long"
    );

    // New account can log in straight away
    app.login("pharmacist", "dispense-42").await;
}

#[tokio::test]
async fn item_lifecycle() {
    let app = TestApp::spawn().await;
    let nurse = app.login(NURSE.0, NURSE.1).await;
    let id = create_gauze(&app, &nurse, 10, 5).await;

    let response = app.get(&format!("/api/items/{}", id), Some(&nurse)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let item = extract_json(response).await;
    assert_eq!(item["name"], "Gauze 10x10");
    assert_eq!(item["quantity"], 10);
    assert_eq!(item["is_low_stock"], false);

    let missing = app.get("/api/items/9999", Some(&nurse)).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(extract_json(missing).await["error"], "not_found");

    let list = extract_json(app.get("/api/items", Some(&nurse)).await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn withdrawal_updates_stock_and_flags_low_stock() {
    let app = TestApp::spawn().await;
    let nurse = app.login(NURSE.0, NURSE.1).await;
    let id = create_gauze(&app, &nurse, 10, 5).await;

    let response = app
        .post(
            "/api/transactions",
            Some(&nurse),
            json!({ "item_id": id, "type": "out", "quantity": 7, "notes": "Ward 7" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let outcome = extract_json(response).await;
    assert_eq!(outcome["item"]["quantity"], 3);
    assert_eq!(outcome["item"]["is_low_stock"], true);
    assert_eq!(outcome["transaction"]["type"], "out");
    assert_eq!(outcome["transaction"]["quantity"], 7);
    assert_eq!(outcome["transaction"]["user"], "nurse");
    assert_eq!(outcome["transaction"]["item_name"], "Gauze 10x10");

    let low = extract_json(app.get("/api/items/low-stock", Some(&nurse)).await).await;
    assert_eq!(low.as_array().unwrap().len(), 1);
    assert_eq!(low[0]["id"], id);
}

#[tokio::test]
async fn invalid_movements_are_rejected() {
    let app = TestApp::spawn().await;
    let nurse = app.login(NURSE.0, NURSE.1).await;
    let id = create_gauze(&app, &nurse, 3, 0).await;

    let zero = app
        .post(
            "/api/transactions",
            Some(&nurse),
            json!({ "item_id": id, "type": "in", "quantity": 0 }),
        )
        .await;
    assert_eq!(zero.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(extract_json(zero).await["error"], "invalid_quantity");

    let overdraw = app
        .post(
            "/api/transactions",
            Some(&nurse),
            json!({ "item_id": id, "type": "out", "quantity": 4 }),
        )
        .await;
    assert_eq!(overdraw.status(), StatusCode::CONFLICT);
    assert_eq!(extract_json(overdraw).await["error"], "insufficient_stock");

    let unknown = app
        .post(
            "/api/transactions",
            Some(&nurse),
            json!({ "item_id": 4242, "type": "in", "quantity": 1 }),
        )
        .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let item = extract_json(app.get(&format!("/api/items/{}", id), Some(&nurse)).await).await;
    assert_eq!(item["quantity"], 3);

    let entries = extract_json(app.get("/api/transactions", Some(&nurse)).await).await;
    assert!(entries.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_quantity_is_invalid_quantity() {
    let app = TestApp::spawn().await;
    let nurse = app.login(NURSE.0, NURSE.1).await;
    let id = create_gauze(&app, &nurse, 10, 0).await;

    for quantity in [json!("five"), json!(2.5), json!(null)] {
        let response = app
            .post(
                "/api/transactions",
                Some(&nurse),
                json!({ "item_id": id, "type": "out", "quantity": quantity }),
            )
            .await;
        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "{}",
            quantity
        );
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/json"));
        assert_eq!(extract_json(response).await["error"], "invalid_quantity");
    }

    let missing = app
        .post(
            "/api/transactions",
            Some(&nurse),
            json!({ "item_id": id, "type": "in" }),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(extract_json(missing).await["error"], "invalid_quantity");

    let item = extract_json(app.get(&format!("/api/items/{}", id), Some(&nurse)).await).await;
    assert_eq!(item["quantity"], 10);
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let app = TestApp::spawn().await;
    let nurse = app.login(NURSE.0, NURSE.1).await;

    let response = app
        .post(
            "/api/transactions",
            Some(&nurse),
            json!({ "item_id": 1, "type": "sideways", "quantity": 1 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].is_string());

    let response = app
        .post("/api/items", Some(&nurse), json!({ "name": 42 }))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(extract_json(response).await["error"], "validation_error");
}

#[tokio::test]
async fn transactions_filter_and_limit() {
    let app = TestApp::spawn().await;
    let nurse = app.login(NURSE.0, NURSE.1).await;
    let gauze = create_gauze(&app, &nurse, 10, 0).await;

    let saline = app
        .post(
            "/api/items",
            Some(&nurse),
            json!({ "name": "Saline 0.9% 500ml", "quantity": 20 }),
        )
        .await;
    let saline = extract_json(saline).await["id"].as_i64().unwrap();

    for (item, kind, quantity) in [
        (gauze, "out", 2),
        (saline, "out", 5),
        (gauze, "in", 12),
    ] {
        let response = app
            .post(
                "/api/transactions",
                Some(&nurse),
                json!({ "item_id": item, "type": kind, "quantity": quantity }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let all: Value =
        extract_json(app.get("/api/transactions", Some(&nurse)).await).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let gauze_only = extract_json(
        app.get(&format!("/api/transactions?item_id={}", gauze), Some(&nurse))
            .await,
    )
    .await;
    let gauze_only = gauze_only.as_array().unwrap();
    assert_eq!(gauze_only.len(), 2);
    assert!(gauze_only.iter().all(|e| e["item_id"] == gauze));

    let limited = extract_json(app.get("/api/transactions?limit=1", Some(&nurse)).await).await;
    assert_eq!(limited.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::spawn().await;
    let response = app.get("/api-docs/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let doc = extract_json(response).await;
    assert!(doc["paths"].get("/api/transactions").is_some());
    assert!(doc["paths"].get("/api/auth/login").is_some());
}
