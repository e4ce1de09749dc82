//! Bearer-token authentication extractor.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use store::{CommerceStore, UserRecord};

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated user attached to a request.
///
/// The token subject is re-resolved against the store on every request,
/// so a deleted account stops authenticating immediately even while its
/// token is still within its lifetime.
pub struct CurrentUser(pub UserRecord);

impl<S> FromRequestParts<Arc<AppState<S>>> for CurrentUser
where
    S: CommerceStore + Clone + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default();

        let Some(token) = header.strip_prefix("Bearer ") else {
            return Err(ApiError::Unauthorized(
                "missing or malformed Authorization header".to_string(),
            ));
        };

        let claims = state
            .auth
            .decode_token(token)
            .map_err(|_| ApiError::Unauthorized("invalid or expired token".to_string()))?;

        let user = state
            .auth
            .find_by_id(claims.sub)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::Unauthorized("unknown user".to_string()))?;

        Ok(CurrentUser(user))
    }
}
