//! Tracker service for the Shiftlog backend
//!
//! Records start/pause/resume/end transitions for work sessions, keeps
//! per-day totals in sync, and stores uploaded screenshots in object
//! storage.

pub mod engine;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod storage;
