//! # Request guards
//!
//! Bearer-token authentication as extractors. Handlers that take an
//! [`AuthUser`] only ever run for a known, active account.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use domains::models::User;
use domains::DomainError;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller. Missing or bad credentials reject with 401
/// before the handler runs; a deactivated account rejects with 403.
pub struct AuthUser(pub User);

/// Authentication if present. Anonymous callers pass through as `None`,
/// as do callers with stale tokens.
pub struct OptionalAuthUser(pub Option<User>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

/// Token to user, shared with the gateway upgrade handler.
pub(crate) async fn authenticate(state: &AppState, token: &str) -> Result<User, ApiError> {
    let user_id = state.tokens.verify(token)?;
    let user = state
        .users
        .find(user_id)
        .await?
        .ok_or_else(|| DomainError::Unauthenticated("User no longer exists".to_owned()))?;
    if !user.is_active {
        return Err(DomainError::forbidden("Account is deactivated").into());
    }
    Ok(user)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            ApiError(DomainError::Unauthenticated(
                "Not authorized to access this route".to_owned(),
            ))
        })?;
        authenticate(state, token).await.map(AuthUser)
    }
}

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(OptionalAuthUser(None));
        };
        Ok(OptionalAuthUser(authenticate(state, token).await.ok()))
    }
}
