//! MovieShelf Backend Library
//!
//! Account signup, login and role-gated access for the MovieShelf API.
//! Exposed as a library so the binary and the integration tests share one
//! router.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;

pub use api::build_router;
pub use config::AppConfig;
pub use error::ApiError;
