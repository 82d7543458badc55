use serde::{Deserialize, Serialize};

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

/// Common pagination query parameters for list endpoints.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

/// Envelope for paginated list responses.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, query: &ListQuery) -> Self {
        Self {
            items,
            total,
            page: query.page,
            limit: query.limit,
        }
    }
}
