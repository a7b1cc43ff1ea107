use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::{error::AppError, models::UserId};

/// Header in which the authenticating gateway forwards the signed-in user's ID
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user making the request
///
/// Authentication happens upstream; this only reads the forwarded identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveUser(pub UserId);

impl ActiveUser {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<UserId>().ok())
            .filter(|id| *id > 0)
            .map(Self)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ActiveUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
            .ok_or_else(|| AppError::InvalidInput("userId is required.".to_string()))
    }
}
