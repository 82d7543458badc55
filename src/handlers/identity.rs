use crate::errors::ServiceError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Acting identity for ledger entries, supplied by the upstream identity
/// layer as an `x-user-id` header. This service records it; it does not
/// authenticate it.
#[derive(Debug, Clone, Copy)]
pub struct ActingUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(USER_ID_HEADER).ok_or_else(|| {
            ServiceError::Unauthorized(format!("missing {} header", USER_ID_HEADER))
        })?;

        let user_id = header
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .ok_or_else(|| {
                ServiceError::Unauthorized(format!("malformed {} header", USER_ID_HEADER))
            })?;

        Ok(ActingUser(user_id))
    }
}
