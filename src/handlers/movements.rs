use crate::entities::stock_movement::{self, MovementOperation, MovementStructure};
use crate::errors::ServiceError;
use crate::handlers::common::{ListQuery, Paginated};
use crate::handlers::identity::ActingUser;
use crate::services::movements::{MovementFilter, MovementSummary, NewMovement, RecordedMovement};
use crate::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Movement submission payload. `stock_two` is required iff `structure`
/// is `paired`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMovementRequest {
    pub operation: MovementOperation,
    pub structure: MovementStructure,
    /// Units to move; must be positive
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 80))]
    pub motive: String,
    pub description: Option<String>,
    pub stock_one: Uuid,
    pub stock_two: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MovementHistoryQuery {
    pub stock_id: Option<Uuid>,
    pub operation: Option<MovementOperation>,
    pub structure: Option<MovementStructure>,
    pub created_by: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    // serde_urlencoded cannot flatten a nested struct, so pagination fields
    // are spelled out here.
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

#[derive(Debug, Deserialize, IntoParams)]
pub struct SummaryQuery {
    /// Trailing window, in days
    #[serde(default = "default_summary_days")]
    pub days: i64,
}

fn default_summary_days() -> i64 {
    30
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_movement).get(list_movements))
        .route("/summary", get(movement_summary))
        .route("/:id", get(get_movement))
}

/// Submit a movement: validated, then applied atomically together with its
/// ledger entry. Not idempotent by design; resubmitting records a second
/// movement.
#[utoipa::path(
    post,
    path = "/api/v1/movements",
    request_body = CreateMovementRequest,
    responses(
        (status = 201, description = "Movement committed; body embeds stock snapshots at commit time"),
        (status = 400, description = "Structural or quantity validation failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown stock reference", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
        (status = 500, description = "Commit failed", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn create_movement(
    State(state): State<AppState>,
    acting_user: ActingUser,
    Json(payload): Json<CreateMovementRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let request = NewMovement {
        operation: payload.operation,
        structure: payload.structure,
        quantity: payload.quantity,
        motive: payload.motive,
        description: payload.description,
        stock_one_id: payload.stock_one,
        stock_two_id: payload.stock_two,
    };

    let recorded: RecordedMovement = state.movement_service.submit(request, acting_user.0).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

/// Ledger history, newest first. `stock_id` matches either side of a
/// movement.
#[utoipa::path(
    get,
    path = "/api/v1/movements",
    params(MovementHistoryQuery),
    responses(
        (status = 200, description = "Movement list returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<MovementHistoryQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = MovementFilter {
        stock_id: query.stock_id,
        operation: query.operation,
        structure: query.structure,
        created_by: query.created_by,
        start_date: query.start_date,
        end_date: query.end_date,
    };

    let (items, total) = state
        .movement_service
        .list(filter, query.page, query.limit)
        .await?;

    let pagination = ListQuery {
        page: query.page,
        limit: query.limit,
    };
    Ok(Json(Paginated::<stock_movement::Model>::new(
        items, total, &pagination,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/movements/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Aggregated movement counts for the trailing window"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn movement_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let summary: MovementSummary = state.movement_service.summary(query.days.max(1)).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/v1/movements/{id}",
    params(("id" = Uuid, Path, description = "Movement id")),
    responses(
        (status = 200, description = "Movement with current stock state"),
        (status = 404, description = "Movement not found", body = crate::errors::ErrorResponse)
    ),
    tag = "movements"
)]
pub async fn get_movement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let recorded = state.movement_service.get(id).await?;
    Ok(Json(recorded))
}
