//! Shared application state for all routes.

use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// When false, tenant-scoped resources skip the tenancy check entirely.
    pub use_tenancy: bool,
}
