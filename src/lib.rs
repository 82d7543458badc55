//! Stockledger API Library
//!
//! Inventory and stock-ledger backend: stock records per product/warehouse
//! and an immutable double-entry style ledger of stock movements.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod services;

use axum::{routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub movement_service: services::movements::MovementService,
    pub stock_service: services::stocks::StockService,
    pub catalog_service: services::catalog::CatalogService,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let movement_service =
            services::movements::MovementService::new(db.clone(), event_sender.clone());
        let stock_service = services::stocks::StockService::new(db.clone(), event_sender.clone());
        let catalog_service = services::catalog::CatalogService::new(db.clone());
        Self {
            db,
            config,
            event_sender,
            movement_service,
            stock_service,
            catalog_service,
        }
    }
}

fn cors_layer(config: &config::AppConfig) -> CorsLayer {
    match config
        .cors_allowed_origins
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        Some(origins) => {
            let parsed: Vec<_> = origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new().allow_origin(parsed).allow_methods(Any)
        }
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any),
    }
}

/// Builds the full application router: health probe, versioned API,
/// OpenAPI document, and the middleware stack.
pub fn app_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", handlers::api_router())
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(openapi::ApiDoc::openapi()) }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .with_state(state)
}
