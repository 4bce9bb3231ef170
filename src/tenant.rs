//! Tenancy authorization: a user may act on resources owned by their tenant or any descendant.

use crate::error::ApiError;
use crate::extractors::CurrentUser;
use sqlx::PgPool;

/// Walks the tenant tree down from the user's tenant ($1) and picks the resource's tenant ($2).
const TENANT_SUBTREE_QUERY: &str = r#"
WITH RECURSIVE q AS (
    SELECT id, active FROM tenant WHERE id = $1
    UNION
    SELECT t.id, t.active FROM tenant t JOIN q ON q.id = t.parent_id
)
SELECT id, active FROM q WHERE id = $2"#;

/// True when `resource_tenant_id` is the user's tenant or one of its descendants, and is active.
/// A user with no tenant is never authorized.
pub async fn is_resource_authorized_to_user(
    pool: &PgPool,
    resource_tenant_id: i32,
    user: &CurrentUser,
) -> Result<bool, ApiError> {
    let Some(user_tenant_id) = user.tenant_id else {
        tracing::debug!(user = %user.user_name, "user has no tenant");
        return Ok(false);
    };
    let row: Option<(i32, bool)> = sqlx::query_as(TENANT_SUBTREE_QUERY)
        .bind(user_tenant_id)
        .bind(resource_tenant_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "checking tenancy");
            ApiError::Db(e)
        })?;
    Ok(match row {
        Some((_, active)) => active,
        None => {
            tracing::debug!(
                user = %user.user_name,
                user_tenant_id,
                resource_tenant_id,
                "resource tenant outside user's tenancy"
            );
            false
        }
    })
}

const ACTIVE_TENANT_SUBTREE_QUERY: &str = r#"
WITH RECURSIVE q AS (
    SELECT id, active FROM tenant WHERE id = $1
    UNION
    SELECT t.id, t.active FROM tenant t JOIN q ON q.id = t.parent_id
)
SELECT id FROM q WHERE active"#;

/// Active tenants the user may see: their own tenant and its descendants. Empty when the user
/// has no tenant.
pub async fn user_tenant_ids(pool: &PgPool, user: &CurrentUser) -> Result<Vec<i32>, ApiError> {
    let Some(user_tenant_id) = user.tenant_id else {
        return Ok(Vec::new());
    };
    sqlx::query_scalar(ACTIVE_TENANT_SUBTREE_QUERY)
        .bind(user_tenant_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "listing user tenants");
            ApiError::Db(e)
        })
}
