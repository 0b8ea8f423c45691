use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, database};
use migration::{Migrator, MigratorTrait};
use server::ServerState;

fn config_path() -> std::path::PathBuf {
    std::env::temp_dir().join("pharmacy_api_test_never_written.json")
}

async fn connected_app() -> Router {
    let db = database::open("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    engine.seed_admin().await.unwrap();
    server::router(ServerState::new(Some(engine), config_path()))
}

fn offline_app() -> Router {
    server::router(ServerState::new(None, config_path()))
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

async fn create_medicine(app: &Router, code: &str, stock: i64) -> i64 {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/medicines",
            json!({
                "code": code,
                "name": "Amoxicillin",
                "type": "capsule",
                "price_minor": 1250,
                "stock": stock,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn login_checks_the_password_hash() {
    let app = connected_app().await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/login",
            json!({"username": "admin", "password": "password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], "dummy-token");
    assert_eq!(body["user"]["role"], "admin");

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/login",
            json!({"username": "admin", "password": "nope"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn offline_server_only_answers_setup_endpoints() {
    let app = offline_app();

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/login",
            json!({"username": "admin", "password": "password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], "offline-token");

    let (status, body) = send(&app, get("/api/medicines")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "database not connected");

    let (status, body) = send(&app, get("/api/system/database/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], false);

    let (status, body) = send(&app, get("/api/system/database")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["password"], "********");
    assert_eq!(body["database"], "pharma_db");
}

#[tokio::test]
async fn stock_flow_over_http() {
    let app = connected_app().await;
    let medicine_id = create_medicine(&app, "AMX", 30).await;

    let (status, inbound) = send(
        &app,
        json_request(
            Method::POST,
            "/api/inbounds",
            json!({"medicine_id": medicine_id, "quantity": 20, "unit_price_minor": 500}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(inbound["quantity"], 20);

    let (status, sale) = send(
        &app,
        json_request(
            Method::POST,
            "/api/sales",
            json!({"medicine_id": medicine_id, "quantity": 5}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sale["total_price_minor"], 6250);
    assert!(sale["order_id"].as_str().unwrap().starts_with("ORD-"));

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/sales",
            json!({"medicine_id": medicine_id, "quantity": 46}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Insufficient stock"));

    let (_, medicine) = send(&app, get(&format!("/api/medicines/{medicine_id}"))).await;
    assert_eq!(medicine["stock"], 45);

    let (status, reversal) = send(
        &app,
        json_request(
            Method::POST,
            "/api/returns/sales",
            json!({"sale_id": sale["id"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reversal["quantity"], 5);

    let (status, adjustment) = send(
        &app,
        json_request(
            Method::POST,
            "/api/stock/adjust",
            json!({"medicine_id": medicine_id, "new_stock": 0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(adjustment["difference"], -50);

    let (status, sales) = send(&app, get("/api/sales")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sales.as_array().unwrap().len(), 0);

    let (_, inbounds) = send(&app, get("/api/inbounds")).await;
    assert_eq!(inbounds[0]["medicine_name"], "Amoxicillin");
}

#[tokio::test]
async fn validation_and_conflicts_map_to_status_codes() {
    let app = connected_app().await;
    create_medicine(&app, "AMX", 0).await;

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/medicines",
            json!({"code": "AMX", "name": "Again", "type": "tablet", "price_minor": 1}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/sales",
            json!({"medicine_id": 999, "quantity": 1}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/inbounds",
            json!({"medicine_id": 1, "quantity": 0, "unit_price_minor": 100}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/users",
            json!({"username": "lisa", "password": "x", "role": "owner"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/reports/financial?type=yearly")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests_with_an_error_message() {
    let app = connected_app().await;
    let medicine_id = create_medicine(&app, "AMX", 10).await;

    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/sales", json!({"medicine_id": medicine_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("quantity"), "{body}");

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/stock/adjust",
            json!({"medicine_id": medicine_id, "new_stock": "ten"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let broken = Request::builder()
        .method(Method::POST)
        .uri("/api/customers")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = send(&app, broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, medicine) = send(&app, get(&format!("/api/medicines/{medicine_id}"))).await;
    assert_eq!(medicine["stock"], 10);
}

#[tokio::test]
async fn reports_and_analysis_answer_with_defaults() {
    let app = connected_app().await;
    create_medicine(&app, "AMX", 10).await;

    let (status, inventory) = send(&app, get("/api/reports/inventory")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inventory["total_stock"], 10);
    assert_eq!(inventory["total_value_minor"], 12500);

    let (status, financial) = send(&app, get("/api/reports/financial")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(financial["report_type"], "monthly");

    let (status, stats) = send(&app, get("/api/dashboard/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["low_stock"], 1);

    let (status, trend) = send(&app, get("/api/analysis/trend")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trend.as_array().unwrap().len(), 30);

    let (status, top) = send(
        &app,
        get("/api/analysis/top-selling?sort_by=total_revenue&order=ASC&limit=5"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(top.as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        get("/api/reports/sales?start_date=2026-03-02&end_date=2026-03-01"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_endpoints_filter_by_keyword() {
    let app = connected_app().await;
    for name in ["Alice Wang", "Bob Li"] {
        let (status, _) = send(
            &app,
            json_request(Method::POST, "/api/customers", json!({"name": name})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, found) = send(&app, get("/api/search/customers?keyword=Wang")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (_, users) = send(&app, get("/api/search/users?keyword=adm")).await;
    assert_eq!(users[0]["username"], "admin");
    assert!(users[0].get("password").is_none());
}

#[tokio::test]
async fn sql_backup_downloads_and_restores() {
    let app = connected_app().await;
    let medicine_id = create_medicine(&app, "AMX", 10).await;

    let response = app
        .clone()
        .oneshot(get("/api/system/backup?format=sql"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/sql"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment;"));
    let script = response.into_body().collect().await.unwrap().to_bytes();

    send(
        &app,
        json_request(
            Method::POST,
            "/api/stock/adjust",
            json!({"medicine_id": medicine_id, "new_stock": 3}),
        ),
    )
    .await;

    let restore = Request::builder()
        .method(Method::POST)
        .uri("/api/system/restore")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(script))
        .unwrap();
    let (status, body) = send(&app, restore).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, medicine) = send(&app, get(&format!("/api/medicines/{medicine_id}"))).await;
    assert_eq!(medicine["stock"], 10);

    let bad = Request::builder()
        .method(Method::POST)
        .uri("/api/system/restore")
        .header(header::CONTENT_TYPE, "application/sql")
        .body(Body::from("DROP TABLE users;"))
        .unwrap();
    let (status, _) = send(&app, bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let app = offline_app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/medicines")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
