mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use stockledger_api::{app_router, config::AppConfig, events::EventSender, AppState};
use tower::ServiceExt;

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 8080,
        environment: "test".into(),
        log_level: "debug".into(),
        log_json: false,
        auto_migrate: true,
        db_max_connections: 1,
        db_min_connections: 1,
        cors_allowed_origins: None,
        request_timeout_secs: 30,
    }
}

async fn test_app() -> (axum::Router, common::TestContext) {
    let ctx = common::setup().await;
    let (tx, rx) = tokio::sync::mpsc::channel(100);
    tokio::spawn(stockledger_api::events::process_events(rx));
    let state = AppState::new(ctx.db.clone(), test_config(), EventSender::new(tx));
    (app_router(state), ctx)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (app, _ctx) = test_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn movement_endpoint_requires_an_acting_user() {
    let (app, ctx) = test_app().await;
    let fx = common::seed_catalog(&ctx).await;
    let stock = common::insert_stock(&ctx, "STK-1", fx.product_id, fx.warehouse_one_id, 10).await;

    let payload = json!({
        "operation": "inbound",
        "structure": "simple",
        "quantity": 5,
        "motive": "restock",
        "stock_one": stock.id,
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/movements")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn movement_endpoint_records_and_rejects() {
    let (app, ctx) = test_app().await;
    let fx = common::seed_catalog(&ctx).await;
    let stock = common::insert_stock(&ctx, "STK-1", fx.product_id, fx.warehouse_one_id, 10).await;

    let payload = json!({
        "operation": "outbound",
        "structure": "simple",
        "quantity": 4,
        "motive": "sale",
        "stock_one": stock.id,
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/movements")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-user-id", fx.user_id.to_string())
                .body(Body::from(payload.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["stock_one"]["quantity"], 6);
    assert_eq!(body["movement"]["operation"], "outbound");

    // Draining past the balance surfaces as an unprocessable entity with the
    // offending side named.
    let payload = json!({
        "operation": "outbound",
        "structure": "simple",
        "quantity": 100,
        "motive": "oversell",
        "stock_one": stock.id,
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/movements")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-user-id", fx.user_id.to_string())
                .body(Body::from(payload.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Unprocessable Entity");
    assert_eq!(body["field"], "quantity");
}

#[tokio::test]
async fn unknown_stock_is_a_not_found() {
    let (app, _ctx) = test_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/stocks/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
