//! Mediaferry API Library
//!
//! This crate provides the HTTP surface, telemetry setup, and application wiring.

pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
mod utils;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use handlers::ingest::UploadResponse;
pub use state::AppState;
