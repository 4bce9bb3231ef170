//! Resource CRUD core for a CDN control plane: filtered reads, validated transactional
//! writes and constraint-aware error classification over PostgreSQL.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod resource;
pub mod resources;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod tenant;

pub use config::Settings;
pub use error::{ApiError, ApiErrorType, ConfigError};
pub use extractors::CurrentUser;
pub use resource::{Creator, Deleter, Identifier, Reader, ResourceKind, Tenantable, Updater, Validator};
pub use routes::{api_router, common_routes, resource_routes};
pub use state::AppState;

/// Version prefix the demo server nests the API under.
pub const API_PREFIX: &str = "/api/1.3";
