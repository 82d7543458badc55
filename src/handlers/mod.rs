pub mod common;
pub mod health;
pub mod identity;
pub mod movements;
pub mod products;
pub mod stocks;
pub mod stores;
pub mod warehouses;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

use axum::Router;

/// Assembles the versioned API surface.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/stores", stores::router())
        .nest("/warehouses", warehouses::router())
        .nest("/products", products::router())
        .nest("/stocks", stocks::router())
        .nest("/movements", movements::router())
}
