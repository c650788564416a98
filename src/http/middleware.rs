use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::warn;

use crate::http::error::ApiError;
use crate::http::state::AppState;

/// Extractor that resolves the `Authorization: Bearer` token to an account id.
pub struct Authenticated(pub String);

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let bearer = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let result = match bearer {
            None => Err(ApiError::unauthorized("No token provided")),
            Some(token) => match state.accounts.resolve_session(&token) {
                Ok(Some(account_id)) => Ok(Authenticated(account_id)),
                Ok(None) => Err(ApiError::forbidden("Invalid token")),
                Err(e) => {
                    warn!(error = %e, "session lookup failed");
                    Err(ApiError::internal("Failed to verify token"))
                }
            },
        };

        async move { result }
    }
}
