//! Common library for the Shiftlog backend
//!
//! This crate provides shared functionality used across the Shiftlog
//! services, including database connectivity and error handling.

pub mod database;
pub mod error;
pub mod schema;
