use crate::entities::stock;
use crate::errors::ServiceError;
use crate::handlers::common::{ListQuery, Paginated};
use crate::services::movements::MovementFilter;
use crate::services::stocks::{NewStock, StockFilter};
use crate::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Stock intake payload. Quantity changes after intake must go through
/// movement submission; there is no direct quantity edit endpoint.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStockRequest {
    #[validate(length(min = 1, max = 100))]
    pub code: String,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub unit_price: Decimal,
    pub expires_at: Option<NaiveDate>,
    #[serde(default = "default_threshold")]
    pub threshold: i32,
}

fn default_threshold() -> i32 {
    5
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StockListQuery {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    #[serde(default)]
    pub include_inactive: bool,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stocks).post(create_stock))
        .route("/summary", get(inventory_summary))
        .route("/low", get(low_stock))
        .route("/:id", get(get_stock).delete(deactivate_stock))
        .route("/:id/movements", get(stock_movements))
}

#[utoipa::path(
    post,
    path = "/api/v1/stocks",
    request_body = CreateStockRequest,
    responses(
        (status = 201, description = "Stock record created"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product or warehouse", body = crate::errors::ErrorResponse),
        (status = 409, description = "Active stock already exists for this product/warehouse", body = crate::errors::ErrorResponse)
    ),
    tag = "stocks"
)]
pub async fn create_stock(
    State(state): State<AppState>,
    Json(payload): Json<CreateStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let request = NewStock {
        code: payload.code,
        product_id: payload.product_id,
        warehouse_id: payload.warehouse_id,
        quantity: payload.quantity,
        unit_price: payload.unit_price,
        expires_at: payload.expires_at,
        threshold: payload.threshold,
    };

    let created = state.stock_service.create(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stocks",
    params(StockListQuery),
    responses((status = 200, description = "Stock list returned")),
    tag = "stocks"
)]
pub async fn list_stocks(
    State(state): State<AppState>,
    Query(query): Query<StockListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = StockFilter {
        product_id: query.product_id,
        warehouse_id: query.warehouse_id,
        include_inactive: query.include_inactive,
    };

    let (items, total) = state
        .stock_service
        .list(filter, query.page, query.limit)
        .await?;

    let pagination = ListQuery {
        page: query.page,
        limit: query.limit,
    };
    Ok(Json(Paginated::<stock::Model>::new(items, total, &pagination)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stocks/summary",
    responses((status = 200, description = "Totals over active stock")),
    tag = "stocks"
)]
pub async fn inventory_summary(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let summary = state.stock_service.inventory_summary().await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/v1/stocks/low",
    responses((status = 200, description = "Active stocks at or below their reorder threshold")),
    tag = "stocks"
)]
pub async fn low_stock(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let items = state.stock_service.low_stock().await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/stocks/{id}",
    params(("id" = Uuid, Path, description = "Stock id")),
    responses(
        (status = 200, description = "Stock with product/warehouse details"),
        (status = 404, description = "Stock not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stocks"
)]
pub async fn get_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let details = state.stock_service.get(id).await?;
    Ok(Json(details))
}

/// Soft delete; ledger history referencing the record is preserved.
#[utoipa::path(
    delete,
    path = "/api/v1/stocks/{id}",
    params(("id" = Uuid, Path, description = "Stock id")),
    responses(
        (status = 200, description = "Stock deactivated"),
        (status = 400, description = "Stock already inactive", body = crate::errors::ErrorResponse),
        (status = 404, description = "Stock not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stocks"
)]
pub async fn deactivate_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.stock_service.deactivate(id).await?;
    Ok(Json(updated))
}

/// Ledger entries touching this stock on either side, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/stocks/{id}/movements",
    params(
        ("id" = Uuid, Path, description = "Stock id"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Movement history for the stock"),
        (status = 404, description = "Stock not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stocks"
)]
pub async fn stock_movements(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    // 404 for unknown stock rather than an empty page
    state.stock_service.get(id).await?;

    let filter = MovementFilter {
        stock_id: Some(id),
        ..Default::default()
    };
    let (items, total) = state
        .movement_service
        .list(filter, pagination.page, pagination.limit)
        .await?;

    Ok(Json(Paginated::new(items, total, &pagination)))
}
