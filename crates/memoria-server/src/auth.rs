//! JWT issuance/verification and password hashing for the REST surface.
//!
//! Tokens carry `sub` (the user id) and `exp` (unix seconds); the REST
//! router extracts the caller's owner id from the `Authorization:
//! Bearer` header on every request that isn't `/auth/*` or `/health`.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::StatusCode;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

pub fn issue_token(user_id: &str, secret: &str, ttl_seconds: i64) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims { sub: user_id.to_string(), exp: chrono::Utc::now().timestamp() + ttl_seconds };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())?;
    Ok(data.claims)
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

/// Extracted from the `Authorization: Bearer <token>` header by any
/// handler that takes it as an argument; rejects with 401 otherwise.
pub struct AuthenticatedUser(pub String);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    crate::rest::AppState: axum::extract::FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = crate::rest::AppState::from_ref(state);
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or((StatusCode::UNAUTHORIZED, "expected a Bearer token"))?;

        let claims = verify_token(token, &state.jwt_secret).map_err(|_| (StatusCode::UNAUTHORIZED, "invalid or expired token"))?;
        Ok(AuthenticatedUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_token() {
        let token = issue_token("user-1", "secret", 3600).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "user-1");
    }

    #[test]
    fn rejects_token_signed_with_a_different_secret() {
        let token = issue_token("user-1", "secret", 3600).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token("user-1", "secret", -10).unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }
}
