use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::identity::{roles, Principal};

/// Principal resolved by `require_auth`, available to downstream handlers
/// for the duration of the request.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Principal);

/// Principal (or absence of one) resolved by `attach_user_optional`.
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<Principal>);

/// Authentication middleware for protected routes. Fails with 401 when
/// the bearer credential is absent or the identity provider rejects it.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Unauthorized - No token provided"))?;

    let principal = state.identity.verify_token(&token).await.map_err(|e| {
        tracing::warn!("Token verification failed: {}", e);
        ApiError::unauthorized("Unauthorized - Invalid token")
    })?;

    request.extensions_mut().insert(CurrentUser(principal));
    Ok(next.run(request).await)
}

/// Best-effort authentication. Never fails the request: a missing or
/// invalid credential leaves the principal slot empty, and verification
/// errors are logged rather than surfaced.
pub async fn attach_user_optional(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = match bearer_token(request.headers()) {
        Some(token) => match state.identity.verify_token(&token).await {
            Ok(principal) => Some(principal),
            Err(e) => {
                tracing::warn!("Ignoring invalid bearer token: {}", e);
                None
            }
        },
        None => None,
    };

    request.extensions_mut().insert(MaybeUser(principal));
    next.run(request).await
}

/// Role-gating middleware. Requires a principal already resolved by
/// `require_auth` upstream; fails with 403 unless the principal holds at
/// least one of the allowed roles.
pub async fn require_roles(
    request: Request,
    next: Next,
    allowed: &[&str],
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::unauthorized("Unauthorized - Authentication required"))?;

    if !roles::has_any(&user.0.roles, allowed) {
        return Err(ApiError::forbidden("Forbidden - Insufficient permissions"));
    }

    Ok(next.run(request).await)
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    require_roles(request, next, &[roles::ROLE_ADMIN]).await
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_a_bearer_token() {
        assert_eq!(
            bearer_token(&headers_with("Bearer abc123")),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers_with("abc123")), None);
        assert_eq!(bearer_token(&headers_with("Basic abc123")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with("Bearer    ")), None);
    }
}
