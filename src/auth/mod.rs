pub mod code;
pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config;

/// Which of the two tokens a JWT is; carried in the `sub` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }

    fn lifetime(&self) -> Duration {
        let security = &config::config().security;
        match self {
            TokenKind::Access => Duration::minutes(security.access_token_minutes),
            TokenKind::Refresh => Duration::hours(security.refresh_token_hours),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: TokenKind,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(kind: TokenKind, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            sub: kind,
            email: email.into(),
            exp: (now + kind.lifetime()).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT generation error: {0}")]
    Generation(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
    #[error("expired {} token", .0.as_str())]
    Expired(TokenKind),
    #[error("invalid {} token", .0.as_str())]
    Invalid(TokenKind),
    #[error("expected a {} token", .0.as_str())]
    WrongKind(TokenKind),
}

pub fn generate_jwt(claims: Claims) -> Result<String, TokenError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, &claims, &encoding_key).map_err(|e| TokenError::Generation(e.to_string()))
}

/// Issue a token of the given kind for `email`
pub fn issue(kind: TokenKind, email: &str) -> Result<String, TokenError> {
    generate_jwt(Claims::new(kind, email))
}

/// Decode `token` and require its `sub` to be `expected`
pub fn validate_jwt(token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    validate_with_secret(token, expected, secret)
}

fn validate_with_secret(token: &str, expected: TokenKind, secret: &str) -> Result<Claims, TokenError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired(expected),
            _ => TokenError::Invalid(expected),
        })?
        .claims;

    if claims.sub != expected {
        return Err(TokenError::WrongKind(expected));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn sign(claims: &Claims) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    fn claims(kind: TokenKind, exp_offset: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims { sub: kind, email: "user@example.com".into(), exp: now + exp_offset, iat: now }
    }

    #[test]
    fn accepts_token_of_expected_kind() {
        let token = sign(&claims(TokenKind::Refresh, 60));
        let decoded = validate_with_secret(&token, TokenKind::Refresh, SECRET).unwrap();
        assert_eq!(decoded.email, "user@example.com");
        assert_eq!(decoded.sub, TokenKind::Refresh);
    }

    #[test]
    fn rejects_access_token_where_refresh_expected() {
        let token = sign(&claims(TokenKind::Access, 60));
        let err = validate_with_secret(&token, TokenKind::Refresh, SECRET).unwrap_err();
        assert!(matches!(err, TokenError::WrongKind(TokenKind::Refresh)));
    }

    #[test]
    fn expired_token_is_reported_with_kind() {
        let token = sign(&claims(TokenKind::Access, -60));
        let err = validate_with_secret(&token, TokenKind::Access, SECRET).unwrap_err();
        assert!(matches!(err, TokenError::Expired(TokenKind::Access)));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = sign(&claims(TokenKind::Access, 60));
        let err = validate_with_secret(&token, TokenKind::Access, "other").unwrap_err();
        assert!(matches!(err, TokenError::Invalid(TokenKind::Access)));
    }

    #[test]
    fn sub_claim_serializes_lowercase() {
        let value = serde_json::to_value(claims(TokenKind::Access, 0)).unwrap();
        assert_eq!(value["sub"], "access");
    }
}
