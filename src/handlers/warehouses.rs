use crate::entities::warehouse;
use crate::errors::ServiceError;
use crate::handlers::common::Paginated;
use crate::handlers::common::ListQuery;
use crate::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateWarehouseRequest {
    pub store_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1))]
    pub address: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateWarehouseRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct WarehouseListQuery {
    pub store_id: Option<Uuid>,
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
        .route("/", get(list_warehouses).post(create_warehouse))
        .route(
            "/:id",
            get(get_warehouse)
                .put(update_warehouse)
                .delete(delete_warehouse),
        )
}

#[utoipa::path(
    post,
    path = "/api/v1/warehouses",
    request_body = CreateWarehouseRequest,
    responses(
        (status = 201, description = "Warehouse created"),
        (status = 404, description = "Store not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn create_warehouse(
    State(state): State<AppState>,
    Json(payload): Json<CreateWarehouseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let created = state
        .catalog_service
        .create_warehouse(payload.store_id, payload.name, payload.address)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/warehouses",
    params(WarehouseListQuery),
    responses((status = 200, description = "Warehouse list returned")),
    tag = "warehouses"
)]
pub async fn list_warehouses(
    State(state): State<AppState>,
    Query(query): Query<WarehouseListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .catalog_service
        .list_warehouses(query.store_id, query.page, query.limit)
        .await?;
    let pagination = ListQuery {
        page: query.page,
        limit: query.limit,
    };
    Ok(Json(Paginated::<warehouse::Model>::new(
        items,
        total,
        &pagination,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/warehouses/{id}",
    params(("id" = Uuid, Path, description = "Warehouse id")),
    responses(
        (status = 200, description = "Warehouse returned"),
        (status = 404, description = "Warehouse not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn get_warehouse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.catalog_service.get_warehouse(id).await?;
    Ok(Json(found))
}

#[utoipa::path(
    put,
    path = "/api/v1/warehouses/{id}",
    params(("id" = Uuid, Path, description = "Warehouse id")),
    request_body = UpdateWarehouseRequest,
    responses(
        (status = 200, description = "Warehouse updated"),
        (status = 404, description = "Warehouse not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn update_warehouse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWarehouseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let updated = state
        .catalog_service
        .update_warehouse(id, payload.name, payload.address)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/warehouses/{id}",
    params(("id" = Uuid, Path, description = "Warehouse id")),
    responses(
        (status = 204, description = "Warehouse deleted"),
        (status = 404, description = "Warehouse not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouses"
)]
pub async fn delete_warehouse(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.catalog_service.delete_warehouse(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
