//! JWT token service

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SUB_ADMIN: &str = "sub_admin";
pub const ROLE_CUSTOMER: &str = "customer";

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Signing secret, at least 32 bytes
    pub secret: String,
    /// Token lifetime in minutes
    pub expiration_minutes: i64,
    pub issuer: String,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, JwtError> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| JwtError::Config("JWT_SECRET must be set".to_string()))?;
        if secret.len() < 32 {
            return Err(JwtError::Config(
                "JWT_SECRET must be at least 32 characters long".to_string(),
            ));
        }
        Ok(Self {
            secret,
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1440),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "bazaar-server".to_string()),
        })
    }
}

/// Claims carried in the token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id (subject)
    pub sub: String,
    pub role: String,
    /// Expiry, Unix seconds
    pub exp: i64,
    /// Issued at, Unix seconds
    pub iat: i64,
    pub iss: String,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),

    #[error("JWT configuration error: {0}")]
    Config(String),
}

/// Authenticated request context, produced by the extractor
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub role: String,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN || self.role == ROLE_SUB_ADMIN
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn generate_token(&self, user_id: &str, role: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: (now + Duration::minutes(self.config.expiration_minutes)).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }

    /// Pull the token out of an `Authorization: Bearer ...` header.
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "0123456789abcdef0123456789abcdef".to_string(),
            expiration_minutes: 60,
            issuer: "bazaar-server".to_string(),
        })
    }

    #[test]
    fn round_trips_claims() {
        let svc = service();
        let token = svc.generate_token("user_1", ROLE_ADMIN).unwrap();
        let claims = svc.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "user_1");
        assert_eq!(claims.role, ROLE_ADMIN);
        assert!(CurrentUser::from(claims).is_admin());
    }

    #[test]
    fn rejects_token_from_other_secret() {
        let other = JwtService::new(JwtConfig {
            secret: "another-secret-of-sufficient-length!".to_string(),
            expiration_minutes: 60,
            issuer: "bazaar-server".to_string(),
        });
        let token = other.generate_token("user_1", ROLE_CUSTOMER).unwrap();
        assert!(matches!(
            service().validate_token(&token),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn header_extraction() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
        assert_eq!(JwtService::extract_from_header("Bearer "), None);
    }
}
