//! JWT signing and verification
//!
//! Access and refresh tokens are signed with a single HMAC secret using
//! HS256. Each token carries an explicit kind claim so an access token can
//! never be replayed as a refresh token (or vice versa).

use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::models::User;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret for signing and verifying tokens
    pub secret: String,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: HMAC secret for signing tokens
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("JWT_REFRESH_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "604800".to_string()) // 7 days
            .parse()
            .unwrap_or(604800);

        Ok(JwtConfig {
            secret,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User email
    pub email: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token kind (access or refresh)
    pub kind: TokenKind,
}

/// Token kind enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived bearer credential
    Access,
    /// Long-lived credential used to mint new access tokens
    Refresh,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    fn sign(&self, sub: Uuid, email: &str, kind: TokenKind, expiry: u64) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub,
            email: email.to_string(),
            iat: now,
            exp: now + expiry,
            kind,
        };

        let token = encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?;
        Ok(token)
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        self.sign(
            user.id,
            &user.email,
            TokenKind::Access,
            self.config.access_token_expiry,
        )
    }

    /// Mint a fresh access token from verified refresh-token claims
    pub fn reissue_access_token(&self, sub: Uuid, email: &str) -> Result<String> {
        self.sign(sub, email, TokenKind::Access, self.config.access_token_expiry)
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user: &User) -> Result<String> {
        self.sign(
            user.id,
            &user.email,
            TokenKind::Refresh,
            self.config.refresh_token_expiry,
        )
    }

    /// Verify a token's signature and expiry
    ///
    /// Invalid, expired, or tampered tokens yield `None`; verification
    /// never surfaces an error to the caller.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .ok()
    }

    /// Verify a token and require a specific kind
    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> Option<Claims> {
        self.verify(token).filter(|claims| claims.kind == kind)
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        })
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = test_service();
        let user = test_user();

        let token = service.generate_access_token(&user).unwrap();
        let claims = service.verify(&token).expect("token should verify");

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_token_carries_refresh_kind() {
        let service = test_service();
        let token = service.generate_refresh_token(&test_user()).unwrap();
        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let service = test_service();
        let user = test_user();

        let access = service.generate_access_token(&user).unwrap();
        assert!(service.verify_kind(&access, TokenKind::Refresh).is_none());

        let refresh = service.generate_refresh_token(&user).unwrap();
        assert!(service.verify_kind(&refresh, TokenKind::Access).is_none());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let service = test_service();
        let other = JwtService::new(JwtConfig {
            secret: "other-secret".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        });

        let token = service.generate_access_token(&test_user()).unwrap();
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let service = test_service();
        assert!(service.verify("not-a-token").is_none());
    }
}
