mod password;

pub use password::{hash_password, verify_password, PasswordError};

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::types::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username; this is what audit attribution records
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(username: String, user_id: i32, role: Role) -> Self {
        Self::with_expiry(username, user_id, role, config::config().security.jwt_expiry_hours)
    }

    pub fn with_expiry(username: String, user_id: i32, role: Role, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: username,
            user_id,
            role,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn expires_in(&self) -> i64 {
        self.exp - self.iat
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidToken(String),
    InvalidSecret,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidToken(msg) => write!(f, "Invalid JWT: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
        }
    }
}

impl std::error::Error for JwtError {}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    generate_jwt_with_secret(claims, &config::config().security.jwt_secret)
}

pub fn generate_jwt_with_secret(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str) -> Result<Claims, JwtError> {
    validate_jwt_with_secret(token, &config::config().security.jwt_secret)
}

/// Checks the HS256 signature and `exp`
pub fn validate_jwt_with_secret(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn token_round_trip_keeps_identity() {
        let claims = Claims::with_expiry("alice".to_string(), 7, Role::Staff, 1);
        let token = generate_jwt_with_secret(&claims, SECRET).unwrap();

        let decoded = validate_jwt_with_secret(&token, SECRET).unwrap();
        assert_eq!(decoded.sub, "alice");
        assert_eq!(decoded.user_id, 7);
        assert_eq!(decoded.role, Role::Staff);
        assert_eq!(decoded.expires_in(), 3600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims::with_expiry("alice".to_string(), 7, Role::Admin, 1);
        let token = generate_jwt_with_secret(&claims, SECRET).unwrap();

        assert!(matches!(
            validate_jwt_with_secret(&token, "some-other-secret"),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = Claims::with_expiry("alice".to_string(), 7, Role::Admin, 1);
        claims.iat -= 7200;
        claims.exp -= 7200;
        let token = generate_jwt_with_secret(&claims, SECRET).unwrap();

        assert!(validate_jwt_with_secret(&token, SECRET).is_err());
    }

    #[test]
    fn empty_secret_never_signs() {
        let claims = Claims::with_expiry("alice".to_string(), 7, Role::Admin, 1);
        assert!(matches!(
            generate_jwt_with_secret(&claims, ""),
            Err(JwtError::InvalidSecret)
        ));
    }
}
