use crate::entities::product;
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
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100))]
    pub code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created"),
        (status = 409, description = "Product code already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let created = state
        .catalog_service
        .create_product(payload.code, payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ListQuery),
    responses((status = 200, description = "Product list returned")),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (items, total) = state
        .catalog_service
        .list_products(pagination.page, pagination.limit)
        .await?;
    Ok(Json(Paginated::<product::Model>::new(
        items,
        total,
        &pagination,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product returned"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let found = state.catalog_service.get_product(id).await?;
    Ok(Json(found))
}
