//! Tubely API Library
//!
//! This crate provides the HTTP handlers, bearer-token authentication and application setup
//! around the upload pipeline.

pub mod auth;
pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
mod utils;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
