//! Authentication service models

pub mod token;
pub mod user;

// Re-export for convenience
pub use token::{NewToken, Token};
pub use user::{LoginCredentials, NewUser, User};
