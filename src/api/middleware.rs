//! Authentication middleware
//!
//! Protected routes go through one of the `require_*` middlewares, which
//! resolve the bearer token to a live session and stash the principal id
//! as a request extension. The acting principal always comes from the
//! token, never from anything client-supplied.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::common::ApiError;
use crate::api::AppState;
use crate::models::PrincipalKind;

/// Creator id recovered from a creator session token
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedCreator(pub i64);

/// User id recovered from a user session token
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub i64);

/// Extract the token from an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn resolve_principal(
    state: &AppState,
    headers: &HeaderMap,
    kind: PrincipalKind,
) -> Result<i64, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let session = state
        .session_service
        .resolve(token)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    if session.principal_kind != kind {
        return Err(ApiError::unauthorized("Invalid or expired token"));
    }

    Ok(session.principal_id)
}

pub async fn require_creator(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let id = resolve_principal(&state, request.headers(), PrincipalKind::Creator).await?;
    request.extensions_mut().insert(AuthenticatedCreator(id));
    Ok(next.run(request).await)
}

pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let id = resolve_principal(&state, request.headers(), PrincipalKind::User).await?;
    request.extensions_mut().insert(AuthenticatedUser(id));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc-123"));
        assert_eq!(bearer_token(&headers), Some("abc-123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());
    }
}
