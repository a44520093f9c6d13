//! # fieldops-server
//!
//! The HTTP surface: an Axum router over the domain crates, a bearer
//! auth extractor, and the mapping from domain errors to the
//! `{success, error}` JSON envelope with conventional status codes.

#![deny(unsafe_code)]

pub mod errors;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;

pub use errors::{ApiError, ApiResult};
pub use extract::AuthUser;
pub use router::build_router;
pub use state::AppState;
