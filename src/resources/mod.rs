//! Concrete resource adapters.

mod delivery_service;
mod parameter;
mod phys_location;
mod region;

pub use delivery_service::DeliveryService;
pub use parameter::{Parameter, SECURE_VALUE_MASK};
pub use phys_location::PhysLocation;
pub use region::Region;

use crate::error::ApiError;
use crate::sql::{bind_filter_values, build_where_and_order_by, FilterSpec};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;

/// Filter `base` with `params` and scan every row. A rejected parameter fails before any query runs.
pub(crate) async fn read_rows<O>(
    pool: &PgPool,
    resource: &'static str,
    base: &str,
    group_by: Option<&str>,
    spec: &FilterSpec,
    params: &HashMap<String, String>,
) -> Result<Vec<O>, ApiError>
where
    O: Send + Unpin + for<'r> FromRow<'r, PgRow>,
{
    read_rows_within(pool, resource, base, group_by, spec, params, None).await
}

/// `read_rows`, additionally keeping only rows whose `column` is one of `ids`.
pub(crate) async fn read_rows_within<O>(
    pool: &PgPool,
    resource: &'static str,
    base: &str,
    group_by: Option<&str>,
    spec: &FilterSpec,
    params: &HashMap<String, String>,
    restriction: Option<(&str, &[i32])>,
) -> Result<Vec<O>, ApiError>
where
    O: Send + Unpin + for<'r> FromRow<'r, PgRow>,
{
    let mut clause = build_where_and_order_by(params, spec).map_err(ApiError::Validation)?;
    if let Some((column, ids)) = restriction {
        clause.and_any(column, ids.to_vec());
    }
    let sql = match group_by {
        Some(g) => clause.apply_grouped(base, g),
        None => clause.apply(base),
    };
    tracing::debug!(resource, sql = %sql, values = ?clause.values, "read");
    bind_filter_values(sqlx::query_as::<_, O>(&sql), &clause.values)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!(resource, error = %e, "querying rows");
            ApiError::Db(e)
        })
}
