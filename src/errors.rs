use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Which side of a movement a quantity check failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockSide {
    StockOne,
    StockTwo,
}

impl StockSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockSide::StockOne => "stock_one",
            StockSide::StockTwo => "stock_two",
        }
    }
}

impl std::fmt::Display for StockSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error body returned to HTTP callers.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Not Found", "Unprocessable Entity")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Request field the error is attributable to, for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Quantity must be a positive integer, got {0}")]
    InvalidQuantity(i32),

    #[error("{0}")]
    StructureMismatch(String),

    #[error("stock_one and stock_two must reference different stock records")]
    DuplicateStockReference,

    #[error("stock_one and stock_two must hold the same product")]
    ProductMismatch,

    #[error("Insufficient stock in {side}: available {available}, requested {requested}")]
    InsufficientStock {
        side: StockSide,
        available: i32,
        requested: i32,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for the error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_)
            | Self::InvalidOperation(_)
            | Self::InvalidQuantity(_)
            | Self::StructureMismatch(_)
            | Self::DuplicateStockReference
            | Self::ProductMismatch => StatusCode::BAD_REQUEST,
            Self::InsufficientStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::DatabaseError(_) | Self::EventError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Request field the error is attributable to, mirroring the
    /// `{field: reason}` body shape validation callers expect.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidQuantity(_) => Some("quantity"),
            Self::StructureMismatch(_) | Self::DuplicateStockReference | Self::ProductMismatch => {
                Some("stock_two")
            }
            Self::InsufficientStock { .. } => Some("quantity"),
            _ => None,
        }
    }

    /// Message suitable for HTTP responses. Internal failures return generic
    /// text so storage details never leak to callers.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::EventError(_) | Self::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message: self.response_message(),
            field: self.field().map(str::to_string),
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(json!(body))).into_response()
    }
}
