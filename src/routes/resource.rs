//! Resource CRUD routes, one collection and one item path per `ResourceKind`.

use crate::handlers::resource::{
    create, create_tenanted, delete, delete_tenanted, read, read_one, read_one_tenanted, read_tenanted, update,
    update_tenanted,
};
use crate::resource::{Creator, Deleter, Reader, ResourceKind, Tenantable, Updater};
use crate::resources::{DeliveryService, Parameter, PhysLocation, Region};
use crate::state::AppState;
use axum::{routing::get, Router};
use serde::{de::DeserializeOwned, Serialize};

fn mount<R>(router: Router<AppState>, segment: &str) -> Router<AppState>
where
    R: Reader + Creator + Updater + Deleter + Serialize + DeserializeOwned + 'static,
{
    router
        .route(&format!("/{}", segment), get(read::<R>).post(create::<R>))
        .route(
            &format!("/{}/:id", segment),
            get(read_one::<R>).put(update::<R>).delete(delete::<R>),
        )
}

fn mount_tenanted<R>(router: Router<AppState>, segment: &str) -> Router<AppState>
where
    R: Reader + Creator + Updater + Deleter + Tenantable + Serialize + DeserializeOwned + 'static,
{
    router
        .route(
            &format!("/{}", segment),
            get(read_tenanted::<R>).post(create_tenanted::<R>),
        )
        .route(
            &format!("/{}/:id", segment),
            get(read_one_tenanted::<R>)
                .put(update_tenanted::<R>)
                .delete(delete_tenanted::<R>),
        )
}

pub fn resource_routes(state: AppState) -> Router {
    ResourceKind::ALL
        .into_iter()
        .fold(Router::new(), |router, kind| {
            let segment = kind.path_segment();
            tracing::debug!(
                segment,
                kind = kind.type_name(),
                tenant_scoped = kind.is_tenant_scoped(),
                "mounting resource routes"
            );
            match kind {
                ResourceKind::DeliveryService => mount_tenanted::<DeliveryService>(router, segment),
                ResourceKind::PhysLocation => mount::<PhysLocation>(router, segment),
                ResourceKind::Region => mount::<Region>(router, segment),
                ResourceKind::Parameter => mount::<Parameter>(router, segment),
            }
        })
        .with_state(state)
}
