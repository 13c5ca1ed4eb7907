//! Token service: issue, verify, refresh, revoke, and clean up tokens
//!
//! Access tokens are stateless JWTs. Refresh tokens are JWTs that are also
//! persisted so they can be revoked before their signed expiry.

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::jwt::{Claims, JwtService, TokenKind};
use crate::models::{NewToken, User};
use crate::repositories::TokenRepository;

/// Token service
#[derive(Clone)]
pub struct TokenService {
    tokens: TokenRepository,
    jwt: JwtService,
}

impl TokenService {
    /// Create a new token service
    pub fn new(tokens: TokenRepository, jwt: JwtService) -> Self {
        Self { tokens, jwt }
    }

    /// Issue a short-lived access token for a user
    pub fn issue_access_token(&self, user: &User) -> Result<String> {
        self.jwt.generate_access_token(user)
    }

    /// Issue a refresh token for a user and persist it
    pub async fn issue_refresh_token(&self, user: &User) -> Result<String> {
        let token = self.jwt.generate_refresh_token(user)?;
        let expires_at = Utc::now() + Duration::seconds(self.jwt.refresh_token_expiry() as i64);

        self.tokens
            .save(&NewToken {
                user_id: user.id,
                token: token.clone(),
                expires_at,
            })
            .await?;

        Ok(token)
    }

    /// Verify a token's signature and expiry
    pub fn verify(&self, token: &str) -> Option<Claims> {
        self.jwt.verify(token)
    }

    /// Exchange a refresh token for a new access token
    ///
    /// The signature and kind are checked locally before the store is
    /// queried for revocation, so a malformed or expired token never
    /// triggers a database lookup. Returns `None` when the token is
    /// invalid, expired, or revoked.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Option<String>> {
        let Some(claims) = self.jwt.verify_kind(refresh_token, TokenKind::Refresh) else {
            return Ok(None);
        };

        if self.tokens.find_active(refresh_token).await?.is_none() {
            info!("Refresh token for user {} not active in store", claims.sub);
            return Ok(None);
        }

        let access_token = self.jwt.reissue_access_token(claims.sub, &claims.email)?;
        Ok(Some(access_token))
    }

    /// Revoke all refresh tokens for a user; idempotent
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<u64> {
        self.tokens.revoke_all_for_user(user_id).await
    }

    /// Revoke a specific refresh token; idempotent
    pub async fn revoke(&self, token: &str) -> Result<u64> {
        self.tokens.revoke(token).await
    }

    /// Delete tokens that are expired or revoked
    ///
    /// Safe to run concurrently and to skip; scheduled periodically from
    /// the service binary.
    pub async fn cleanup_expired(&self) -> Result<u64> {
        self.tokens.delete_expired_or_revoked().await
    }

    /// Get the access token expiry in seconds
    pub fn access_token_expiry(&self) -> u64 {
        self.jwt.access_token_expiry()
    }
}
