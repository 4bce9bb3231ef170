//! Generic resource handlers, instantiated per resource type at route registration.
//!
//! Writes run validation, then the tenancy check for tenant-scoped resources, then the
//! mutation itself. Successful mutations are recorded on the `audit` log target.

use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::resource::{parse_keys, Creator, Deleter, Identifier, Reader, Tenantable, Updater, Validator};
use crate::response::{Alerts, MutationResponse, ReadResponse};
use crate::routes::MAX_BODY_BYTES;
use crate::service::to_messages;
use crate::state::AppState;
use crate::tenant;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;

type Params = HashMap<String, String>;

/// A body cut off by the request size limit is 413; any other rejection is a validation error.
fn decode<R>(body: Result<Json<R>, JsonRejection>) -> Result<R, ApiError> {
    body.map(|Json(r)| r).map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(format!("request body exceeds {} bytes", MAX_BODY_BYTES))
        } else {
            ApiError::validation(format!("could not decode body: {}", e.body_text()))
        }
    })
}

async fn check_valid<R: Validator>(resource: &R, pool: &PgPool) -> Result<(), ApiError> {
    let errors = resource.validate(pool).await?;
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(to_messages(&errors)))
    }
}

fn audit<R: Identifier>(user: &CurrentUser, resource: &R, action: &str) {
    tracing::info!(
        target: "audit",
        user = %user.user_name,
        kind = R::TYPE_NAME,
        name = %resource.audit_name(),
        keys = ?resource.keys(),
        "{} {}",
        R::DISPLAY_NAME,
        action
    );
}

async fn ensure_tenant<R: Tenantable>(state: &AppState, user: &CurrentUser, resource: &R) -> Result<(), ApiError> {
    if !state.use_tenancy || resource.is_tenant_authorized(user, &state.pool).await? {
        return Ok(());
    }
    Err(ApiError::Forbidden("user not authorized for requested tenant".into()))
}

/// Path and query parameters together; path parameters win.
fn merge_params(path: Params, mut query: Params) -> Params {
    query.extend(path);
    query
}

/// The stored row addressed by the path keys.
async fn find_existing<R>(state: &AppState, user: &CurrentUser, path: &Params) -> Result<R, ApiError>
where
    R: Reader + Identifier,
{
    parse_keys::<R>(path)?;
    R::read(&state.pool, path, user)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::DataMissing(format!("no {} found with this id", R::DISPLAY_NAME)))
}

/// Rows the user may see. Rows without a tenant are never visible.
async fn read_visible<R>(state: &AppState, user: &CurrentUser, params: &Params) -> Result<Vec<R>, ApiError>
where
    R: Reader + Tenantable,
{
    if !state.use_tenancy {
        return R::read(&state.pool, params, user).await;
    }
    let tenants = tenant::user_tenant_ids(&state.pool, user).await?;
    R::read_in_tenants(&state.pool, params, &tenants).await
}

pub async fn read<R>(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<Params>,
) -> Result<Json<ReadResponse<R>>, ApiError>
where
    R: Reader + Serialize,
{
    let response = R::read(&state.pool, &params, &user).await?;
    Ok(Json(ReadResponse { response }))
}

pub async fn read_one<R>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(path): Path<Params>,
    Query(query): Query<Params>,
) -> Result<Json<ReadResponse<R>>, ApiError>
where
    R: Reader + Identifier + Serialize,
{
    parse_keys::<R>(&path)?;
    let response = R::read(&state.pool, &merge_params(path, query), &user).await?;
    Ok(Json(ReadResponse { response }))
}

pub async fn create<R>(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<R>, JsonRejection>,
) -> Result<(StatusCode, Json<MutationResponse<R>>), ApiError>
where
    R: Creator + Serialize + DeserializeOwned,
{
    let mut resource = decode(body)?;
    check_valid(&resource, &state.pool).await?;
    resource.create(&state.pool, &user).await?;
    audit(&user, &resource, "created");
    let text = format!("{} was created.", R::DISPLAY_NAME);
    Ok((StatusCode::CREATED, Json(MutationResponse::new(text, resource))))
}

pub async fn update<R>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(path): Path<Params>,
    body: Result<Json<R>, JsonRejection>,
) -> Result<Json<MutationResponse<R>>, ApiError>
where
    R: Updater + Serialize + DeserializeOwned,
{
    let keys = parse_keys::<R>(&path)?;
    let mut resource = decode(body)?;
    resource.set_keys(keys);
    check_valid(&resource, &state.pool).await?;
    resource.update(&state.pool, &user).await?;
    audit(&user, &resource, "updated");
    let text = format!("{} was updated.", R::DISPLAY_NAME);
    Ok(Json(MutationResponse::new(text, resource)))
}

pub async fn delete<R>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(path): Path<Params>,
) -> Result<Json<Alerts>, ApiError>
where
    R: Deleter,
{
    let resource = R::with_keys(parse_keys::<R>(&path)?);
    resource.delete(&state.pool, &user).await?;
    audit(&user, &resource, "deleted");
    Ok(Json(Alerts::success(format!("{} was deleted.", R::DISPLAY_NAME))))
}

pub async fn read_tenanted<R>(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<Params>,
) -> Result<Json<ReadResponse<R>>, ApiError>
where
    R: Reader + Tenantable + Serialize,
{
    let response = read_visible(&state, &user, &params).await?;
    Ok(Json(ReadResponse { response }))
}

pub async fn read_one_tenanted<R>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(path): Path<Params>,
    Query(query): Query<Params>,
) -> Result<Json<ReadResponse<R>>, ApiError>
where
    R: Reader + Identifier + Tenantable + Serialize,
{
    parse_keys::<R>(&path)?;
    let response = read_visible(&state, &user, &merge_params(path, query)).await?;
    Ok(Json(ReadResponse { response }))
}

pub async fn create_tenanted<R>(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<R>, JsonRejection>,
) -> Result<(StatusCode, Json<MutationResponse<R>>), ApiError>
where
    R: Creator + Tenantable + Serialize + DeserializeOwned,
{
    let mut resource = decode(body)?;
    check_valid(&resource, &state.pool).await?;
    ensure_tenant(&state, &user, &resource).await?;
    resource.create(&state.pool, &user).await?;
    audit(&user, &resource, "created");
    let text = format!("{} was created.", R::DISPLAY_NAME);
    Ok((StatusCode::CREATED, Json(MutationResponse::new(text, resource))))
}

/// Both the stored row and the replacement must belong to the user's tenancy.
pub async fn update_tenanted<R>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(path): Path<Params>,
    body: Result<Json<R>, JsonRejection>,
) -> Result<Json<MutationResponse<R>>, ApiError>
where
    R: Updater + Reader + Tenantable + Serialize + DeserializeOwned,
{
    let keys = parse_keys::<R>(&path)?;
    let mut resource = decode(body)?;
    resource.set_keys(keys);
    check_valid(&resource, &state.pool).await?;
    let existing: R = find_existing(&state, &user, &path).await?;
    ensure_tenant(&state, &user, &existing).await?;
    ensure_tenant(&state, &user, &resource).await?;
    resource.update(&state.pool, &user).await?;
    audit(&user, &resource, "updated");
    let text = format!("{} was updated.", R::DISPLAY_NAME);
    Ok(Json(MutationResponse::new(text, resource)))
}

pub async fn delete_tenanted<R>(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(path): Path<Params>,
) -> Result<Json<Alerts>, ApiError>
where
    R: Deleter + Reader + Tenantable,
{
    let existing: R = find_existing(&state, &user, &path).await?;
    ensure_tenant(&state, &user, &existing).await?;
    existing.delete(&state.pool, &user).await?;
    audit(&user, &existing, "deleted");
    Ok(Json(Alerts::success(format!("{} was deleted.", R::DISPLAY_NAME))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_parameters_override_query_parameters() {
        let path = Params::from([("id".to_string(), "4".to_string())]);
        let query = Params::from([
            ("id".to_string(), "9".to_string()),
            ("orderby".to_string(), "name".to_string()),
        ]);
        let merged = merge_params(path, query);
        assert_eq!(merged.get("id").map(String::as_str), Some("4"));
        assert_eq!(merged.get("orderby").map(String::as_str), Some("name"));
    }
}
