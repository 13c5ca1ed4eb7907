//! Integration tests for the authentication flows
//!
//! These tests run against the database configured via DATABASE_URL and
//! are skipped when it is not exported.

use auth::error::AuthError;
use auth::jwt::{JwtConfig, JwtService, TokenKind};
use auth::models::NewUser;
use auth::repositories::{TokenRepository, UserRepository};
use auth::service::AuthService;
use auth::tokens::TokenService;
use common::{database, schema};
use serial_test::serial;
use sqlx::PgPool;
use uuid::Uuid;

async fn setup() -> Option<(PgPool, AuthService, TokenService)> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set, skipping auth integration test");
        return None;
    }

    let config = database::DatabaseConfig::from_env().unwrap();
    let pool = database::init_pool(&config).await.unwrap();
    schema::register(&pool).await.unwrap();

    let jwt = JwtService::new(JwtConfig {
        secret: "auth-flow-test-secret".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 604800,
    });
    let tokens = TokenService::new(TokenRepository::new(pool.clone()), jwt);
    let auth = AuthService::new(UserRepository::new(pool.clone()), tokens.clone()).unwrap();

    Some((pool, auth, tokens))
}

fn unique_user() -> NewUser {
    NewUser {
        name: "Flow Tester".to_string(),
        email: format!("flow-{}@example.com", Uuid::new_v4()),
        password: "correct-horse-battery".to_string(),
        is_admin: false,
    }
}

#[tokio::test]
#[serial]
async fn refresh_token_round_trip_and_revocation() {
    let Some((_pool, auth, tokens)) = setup().await else {
        return;
    };

    let new_user = unique_user();
    let user = auth.register(new_user.clone()).await.unwrap();

    let refresh_token = tokens.issue_refresh_token(&user).await.unwrap();

    // The issued token verifies locally and carries the refresh kind.
    let claims = tokens.verify(&refresh_token).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.kind, TokenKind::Refresh);

    // It can be exchanged for an access token while active.
    let access = tokens.refresh(&refresh_token).await.unwrap();
    assert!(access.is_some());

    // After revocation the exchange fails, even though the signature is
    // still valid.
    tokens.revoke(&refresh_token).await.unwrap();
    let access = tokens.refresh(&refresh_token).await.unwrap();
    assert!(access.is_none());

    // Revoking again is a no-op, not an error.
    tokens.revoke(&refresh_token).await.unwrap();

    match auth.refresh_access_token(&refresh_token).await {
        Err(AuthError::Unauthorized) => {}
        other => panic!("expected Unauthorized, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
#[serial]
async fn access_token_is_not_accepted_as_refresh_token() {
    let Some((_pool, auth, tokens)) = setup().await else {
        return;
    };

    let user = auth.register(unique_user()).await.unwrap();
    let access_token = tokens.issue_access_token(&user).unwrap();

    // Signature and expiry are fine, but the kind claim does not match.
    let refreshed = tokens.refresh(&access_token).await.unwrap();
    assert!(refreshed.is_none());
}

#[tokio::test]
#[serial]
async fn login_failures_are_uniform_and_login_rotates_tokens() {
    let Some((_pool, auth, tokens)) = setup().await else {
        return;
    };

    let new_user = unique_user();
    let user = auth.register(new_user.clone()).await.unwrap();

    // Wrong password twice: 401 both times, same message as unknown email.
    for _ in 0..2 {
        match auth.login(&new_user.email, "wrong-password").await {
            Err(AuthError::Unauthorized) => {}
            _ => panic!("expected Unauthorized for wrong password"),
        }
    }
    match auth.login("nobody@example.com", "whatever-pass").await {
        Err(AuthError::Unauthorized) => {}
        _ => panic!("expected Unauthorized for unknown email"),
    }

    // A token issued before login must be revoked by the login.
    let old_refresh = tokens.issue_refresh_token(&user).await.unwrap();

    let (logged_in, issued) = auth
        .login(&new_user.email, &new_user.password)
        .await
        .unwrap();
    assert_eq!(logged_in.id, user.id);

    assert!(tokens.refresh(&old_refresh).await.unwrap().is_none());
    assert!(tokens.refresh(&issued.refresh_token).await.unwrap().is_some());
}

#[tokio::test]
#[serial]
async fn duplicate_email_registration_conflicts() {
    let Some((_pool, auth, _tokens)) = setup().await else {
        return;
    };

    let new_user = unique_user();
    auth.register(new_user.clone()).await.unwrap();

    match auth.register(new_user).await {
        Err(AuthError::Conflict(_)) => {}
        _ => panic!("expected Conflict for duplicate email"),
    }
}

#[tokio::test]
#[serial]
async fn logout_is_idempotent() {
    let Some((_pool, auth, _tokens)) = setup().await else {
        return;
    };

    let new_user = unique_user();
    auth.register(new_user.clone()).await.unwrap();
    let (_, issued) = auth
        .login(&new_user.email, &new_user.password)
        .await
        .unwrap();

    auth.logout(&issued.refresh_token).await.unwrap();
    auth.logout(&issued.refresh_token).await.unwrap();

    match auth.refresh_access_token(&issued.refresh_token).await {
        Err(AuthError::Unauthorized) => {}
        _ => panic!("expected Unauthorized after logout"),
    }
}
