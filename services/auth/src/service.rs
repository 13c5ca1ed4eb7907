//! Auth service orchestrating credential checks and the token service

use tracing::{error, info};

use crate::error::{AuthError, AuthResult};
use crate::models::{NewUser, User};
use crate::repositories::UserRepository;
use crate::tokens::TokenService;
use crate::validation;

/// Tokens returned by a successful login
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

/// Auth service
///
/// Holds explicit handles to its collaborators; there are no process-wide
/// singletons.
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    tokens: TokenService,
    /// Hash verified against when the email is unknown, so unknown-email
    /// and bad-password failures take the same time.
    dummy_hash: String,
}

impl AuthService {
    /// Create a new auth service
    pub fn new(users: UserRepository, tokens: TokenService) -> anyhow::Result<Self> {
        let dummy_hash = UserRepository::hash_password("dummy-password-for-unknown-users")?;
        Ok(Self {
            users,
            tokens,
            dummy_hash,
        })
    }

    /// Register a new user
    ///
    /// Validates the input and fails with `Conflict` when the email is
    /// already registered.
    pub async fn register(&self, new_user: NewUser) -> AuthResult<User> {
        validation::validate_name(&new_user.name).map_err(AuthError::Validation)?;
        validation::validate_email(&new_user.email).map_err(AuthError::Validation)?;
        validation::validate_password(&new_user.password).map_err(AuthError::Validation)?;

        self.users.create(&new_user).await.map_err(|e| {
            let is_duplicate = e
                .downcast_ref::<sqlx::Error>()
                .and_then(|e| e.as_database_error())
                .is_some_and(|db| db.is_unique_violation());

            if is_duplicate {
                AuthError::Conflict("Email is already registered".to_string())
            } else {
                error!("Failed to create user: {}", e);
                AuthError::Internal
            }
        })
    }

    /// Log a user in with email and password
    ///
    /// Unknown email and wrong password are indistinguishable to the
    /// caller. A successful login revokes every refresh token issued
    /// before it, so only one session chain is active per user.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<(User, IssuedTokens)> {
        let user = self.users.find_by_email(email).await.map_err(|e| {
            error!("Failed to look up user: {}", e);
            AuthError::Internal
        })?;

        let password_valid = match &user {
            Some(user) => UserRepository::verify_password(&user.password_hash, password),
            None => {
                // Burn the same work as a real verification.
                UserRepository::verify_password(&self.dummy_hash, password);
                false
            }
        };

        let (Some(user), true) = (user, password_valid) else {
            return Err(AuthError::Unauthorized);
        };

        self.tokens.revoke_all(user.id).await.map_err(|e| {
            error!("Failed to revoke tokens for user {}: {}", user.id, e);
            AuthError::Internal
        })?;

        let refresh_token = self.tokens.issue_refresh_token(&user).await.map_err(|e| {
            error!("Failed to issue refresh token: {}", e);
            AuthError::Internal
        })?;

        let access_token = self.tokens.issue_access_token(&user).map_err(|e| {
            error!("Failed to issue access token: {}", e);
            AuthError::Internal
        })?;

        info!("User {} logged in", user.id);

        let tokens = IssuedTokens {
            access_token,
            refresh_token,
            expires_in: self.tokens.access_token_expiry(),
        };
        Ok((user, tokens))
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh_access_token(&self, refresh_token: &str) -> AuthResult<String> {
        let access_token = self.tokens.refresh(refresh_token).await.map_err(|e| {
            error!("Failed to refresh access token: {}", e);
            AuthError::Internal
        })?;

        access_token.ok_or(AuthError::Unauthorized)
    }

    /// Revoke the given refresh token; idempotent
    pub async fn logout(&self, refresh_token: &str) -> AuthResult<()> {
        self.tokens.revoke(refresh_token).await.map_err(|e| {
            error!("Failed to revoke token: {}", e);
            AuthError::Internal
        })?;

        Ok(())
    }

    /// Access the underlying token service
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}
