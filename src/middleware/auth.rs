use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::auth::{validate_jwt, Claims, TokenError, TokenKind};
use crate::error::ApiError;

/// Authenticated caller, identified by the email the token was issued for
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { email: claims.email }
    }
}

/// Require a valid access token; 401 when missing or invalid, 419 when expired
pub async fn require_access(headers: HeaderMap, request: Request, next: Next) -> Response {
    require_token(TokenKind::Access, &headers, request, next).await
}

/// Require a valid refresh token (used only by the token endpoint)
pub async fn require_refresh(headers: HeaderMap, request: Request, next: Next) -> Response {
    require_token(TokenKind::Refresh, &headers, request, next).await
}

/// Attach the caller when a valid access token is present. An expired token
/// still answers 419 so the client renews it; anything else is ignored.
pub async fn optional_user(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    if let Some(token) = extract_token(&headers) {
        match validate_jwt(token, TokenKind::Access) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthUser::from(claims));
            }
            Err(TokenError::Expired(kind)) => return ApiError::token_expired(kind).into_response(),
            Err(e) => debug!("Ignoring unusable token on optional route: {}", e),
        }
    }

    next.run(request).await
}

async fn require_token(kind: TokenKind, headers: &HeaderMap, mut request: Request, next: Next) -> Response {
    let Some(token) = extract_token(headers) else {
        return ApiError::unauthorized("Missing Authorization header").into_response();
    };

    match validate_jwt(token, kind) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthUser::from(claims));
            next.run(request).await
        }
        Err(e) => {
            warn!("Rejected {} token on {}: {}", kind.as_str(), request.uri().path(), e);
            ApiError::from(e).into_response()
        }
    }
}

/// Accepts `Bearer <jwt>` as well as a bare token
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_and_bare_tokens() {
        assert_eq!(extract_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(extract_token(&headers("abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn empty_authorization_has_no_token() {
        assert_eq!(extract_token(&headers("Bearer ")), None);
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
