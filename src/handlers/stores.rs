use crate::entities::store;
use crate::errors::ServiceError;
use crate::handlers::common::{ListQuery, Paginated};
use crate::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStoreRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1))]
    pub address: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStoreRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub address: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stores).post(create_store))
        .route(
            "/:id",
            get(get_store).put(update_store).delete(delete_store),
        )
}

#[utoipa::path(
    post,
    path = "/api/v1/stores",
    request_body = CreateStoreRequest,
    responses((status = 201, description = "Store created")),
    tag = "stores"
)]
pub async fn create_store(
    State(state): State<AppState>,
    Json(payload): Json<CreateStoreRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let created = state
        .catalog_service
        .create_store(payload.name, payload.address)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/stores",
    params(ListQuery),
    responses((status = 200, description = "Store list returned")),
    tag = "stores"
)]
pub async fn list_stores(
    State(state): State<AppState>,
    Query(pagination): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .catalog_service
        .list_stores(pagination.page, pagination.limit)
        .await?;
    Ok(Json(Paginated::<store::Model>::new(
        items,
        total,
        &pagination,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/stores/{id}",
    params(("id" = Uuid, Path, description = "Store id")),
    responses(
        (status = 200, description = "Store returned"),
        (status = 404, description = "Store not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stores"
)]
pub async fn get_store(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.catalog_service.get_store(id).await?;
    Ok(Json(found))
}

#[utoipa::path(
    put,
    path = "/api/v1/stores/{id}",
    params(("id" = Uuid, Path, description = "Store id")),
    request_body = UpdateStoreRequest,
    responses(
        (status = 200, description = "Store updated"),
        (status = 404, description = "Store not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stores"
)]
pub async fn update_store(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStoreRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let updated = state
        .catalog_service
        .update_store(id, payload.name, payload.address)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/stores/{id}",
    params(("id" = Uuid, Path, description = "Store id")),
    responses(
        (status = 204, description = "Store deleted"),
        (status = 404, description = "Store not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stores"
)]
pub async fn delete_store(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.catalog_service.delete_store(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
