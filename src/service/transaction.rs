//! Transactional write protocol shared by every resource.
//!
//! Each write runs in its own transaction on one pooled connection: begin, execute,
//! verify the affected row count, then commit or roll back. Database failures are
//! classified once and never retried.

use crate::error::{ApiError, ApiErrorType};
use crate::sql::constraint;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgConnection, PgRow, Postgres};
use sqlx::query::{Query, QueryAs};
use sqlx::{FromRow, PgPool, Transaction};

/// Row returned by an insert: the generated key and timestamp.
#[derive(Clone, Copy, Debug, FromRow)]
pub struct Written {
    pub id: i32,
    pub last_updated: DateTime<Utc>,
}

/// Row returned by an update: the refreshed timestamp.
#[derive(Clone, Copy, Debug, FromRow)]
pub struct Stamp {
    pub last_updated: DateTime<Utc>,
}

/// Open transaction for one mutation. Dropping it without `commit` rolls back.
pub struct MutationTx {
    tx: Transaction<'static, Postgres>,
    resource: &'static str,
}

impl MutationTx {
    pub async fn begin(pool: &PgPool, resource: &'static str) -> Result<Self, ApiError> {
        let tx = pool.begin().await.map_err(|e| {
            tracing::error!(resource, error = %e, "could not begin transaction");
            ApiError::Db(e)
        })?;
        Ok(MutationTx { tx, resource })
    }

    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<(), ApiError> {
        let resource = self.resource;
        self.tx.commit().await.map_err(|e| {
            tracing::error!(resource, error = %e, "could not commit transaction");
            ApiError::Db(e)
        })
    }

    /// Roll back and hand back `cause`. A rollback failure is only logged.
    pub async fn rollback(self, cause: ApiError) -> ApiError {
        let resource = self.resource;
        if let Err(e) = self.tx.rollback().await {
            tracing::error!(resource, error = %e, cause = %cause, "could not roll back transaction");
        }
        cause
    }
}

/// Run an INSERT ... RETURNING that must yield exactly one row.
pub async fn insert<'q, O>(
    pool: &PgPool,
    resource: &'static str,
    query: QueryAs<'q, Postgres, O, PgArguments>,
) -> Result<O, ApiError>
where
    O: Send + Unpin + for<'r> FromRow<'r, PgRow>,
{
    let mut tx = MutationTx::begin(pool, resource).await?;
    let rows = match query.fetch_all(tx.conn()).await {
        Ok(rows) => rows,
        Err(e) => return Err(tx.rollback(classify_write_error(resource, e)).await),
    };
    let [row]: [O; 1] = match rows.try_into() {
        Ok(one) => one,
        Err(rows) => {
            let cause = if rows.is_empty() {
                ApiError::System(format!("no {} was inserted, no id was returned", resource))
            } else {
                ApiError::System(format!("too many ids returned from {} insert", resource))
            };
            return Err(tx.rollback(cause).await);
        }
    };
    tx.commit().await?;
    Ok(row)
}

/// Run an UPDATE ... RETURNING that must touch exactly one row.
pub async fn update<'q, O>(
    pool: &PgPool,
    resource: &'static str,
    query: QueryAs<'q, Postgres, O, PgArguments>,
) -> Result<O, ApiError>
where
    O: Send + Unpin + for<'r> FromRow<'r, PgRow>,
{
    let mut tx = MutationTx::begin(pool, resource).await?;
    let rows = match query.fetch_all(tx.conn()).await {
        Ok(rows) => rows,
        Err(e) => return Err(tx.rollback(classify_write_error(resource, e)).await),
    };
    let [row]: [O; 1] = match rows.try_into() {
        Ok(one) => one,
        Err(rows) => {
            let cause = affected_error(resource, rows.len() as u64, "update");
            return Err(tx.rollback(cause).await);
        }
    };
    tx.commit().await?;
    Ok(row)
}

/// Run a DELETE that must remove exactly one row.
pub async fn delete<'q>(
    pool: &PgPool,
    resource: &'static str,
    query: Query<'q, Postgres, PgArguments>,
) -> Result<(), ApiError> {
    let mut tx = MutationTx::begin(pool, resource).await?;
    let affected = match query.execute(tx.conn()).await {
        Ok(done) => done.rows_affected(),
        Err(e) => return Err(tx.rollback(classify_write_error(resource, e)).await),
    };
    if let Err(cause) = check_affected(resource, affected, "delete") {
        return Err(tx.rollback(cause).await);
    }
    tx.commit().await
}

fn check_affected(resource: &str, affected: u64, action: &str) -> Result<(), ApiError> {
    match affected {
        1 => Ok(()),
        n => Err(affected_error(resource, n, action)),
    }
}

/// Error for a write that touched `affected` rows where exactly one was expected.
fn affected_error(resource: &str, affected: u64, action: &str) -> ApiError {
    match affected {
        0 => ApiError::DataMissing(format!("no {} found with this id", resource)),
        n => ApiError::System(format!("this {} affected too many rows: {}", action, n)),
    }
}

/// Conflicts name the offending field; anything else is a system error with details logged.
pub fn classify_write_error(resource: &str, err: sqlx::Error) -> ApiError {
    match constraint::classify(&err) {
        (Some(description), ApiErrorType::DataConflict) => {
            tracing::debug!(resource, error = %err, "write rejected by constraint");
            ApiError::Conflict(format!("a {} with {}", resource, description))
        }
        _ => {
            tracing::error!(resource, error = %err, "write failed");
            ApiError::Db(err)
        }
    }
}
