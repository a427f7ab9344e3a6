//! Shared building blocks for the campus matching services: error model,
//! response envelopes, event envelope, auth extractor, tracing and clients.

pub mod clients;
pub mod errors;
pub mod middleware;
pub mod types;

pub use errors::{AppError, AppResult, ErrorCode};
pub use types::*;
