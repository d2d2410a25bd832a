//! Axum HTTP API.
//!
//! This crate provides:
//! - Video upload with immediate local frame extraction
//! - Listing of processed frame archives
//! - Archive download with path validation
//! - Health check

pub mod config;
pub mod error;
pub mod files;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use files::FileStore;
pub use routes::create_router;
pub use state::AppState;
