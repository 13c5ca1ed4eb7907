//! Authentication service for the Shiftlog backend
//!
//! Issues and refreshes session tokens, verifies credentials, and keeps
//! the persisted refresh-token records tidy.

pub mod error;
pub mod jwt;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod service;
pub mod tokens;
pub mod validation;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: service::AuthService,
}
