//! Capability contract every resource adapter implements.
//!
//! A resource is addressed by typed keys (`Identifier`), checked before writes (`Validator`),
//! listed through the filter builder (`Reader`) and written through the mutation protocol
//! (`Creator`, `Updater`, `Deleter`). Tenant-scoped resources add `Tenantable`.

mod keys;
pub use keys::*;

use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::service::FieldError;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::fmt::Debug;

pub trait Identifier {
    type Keys: Clone + Debug + Send + Sync;

    /// Short type tag used in audit records.
    const TYPE_NAME: &'static str;
    /// Name used in client-facing messages ("a region with ...").
    const DISPLAY_NAME: &'static str;

    fn key_fields() -> &'static [KeyFieldInfo];
    fn keys_from_map(map: &KeyMap) -> Option<Self::Keys>;
    /// None until every key field is populated.
    fn keys(&self) -> Option<Self::Keys>;
    fn set_keys(&mut self, keys: Self::Keys);
    /// Human-readable name for audit logging; never used for identity.
    fn audit_name(&self) -> String;
}

#[async_trait]
pub trait Validator: Send + Sync {
    /// Every violated field, one message each. `Ok` and empty means valid; `Err` means the
    /// checks themselves could not run.
    async fn validate(&self, pool: &PgPool) -> Result<Vec<FieldError>, ApiError>;
}

#[async_trait]
pub trait Reader: Sized + Send {
    async fn read(
        pool: &PgPool,
        params: &HashMap<String, String>,
        user: &CurrentUser,
    ) -> Result<Vec<Self>, ApiError>;
}

#[async_trait]
pub trait Creator: Identifier + Validator {
    /// Insert and, on success, populate the generated key and timestamp.
    async fn create(&mut self, pool: &PgPool, user: &CurrentUser) -> Result<(), ApiError>;
}

#[async_trait]
pub trait Updater: Identifier + Validator {
    /// Update the row addressed by `keys()` and refresh the timestamp.
    async fn update(&mut self, pool: &PgPool, user: &CurrentUser) -> Result<(), ApiError>;
}

#[async_trait]
pub trait Deleter: Identifier + Default + Send + Sync {
    async fn delete(&self, pool: &PgPool, user: &CurrentUser) -> Result<(), ApiError>;

    fn with_keys(keys: Self::Keys) -> Self {
        let mut r = Self::default();
        r.set_keys(keys);
        r
    }
}

#[async_trait]
pub trait Tenantable: Send + Sync {
    fn tenant_id(&self) -> Option<i32>;

    /// Like `Reader::read`, restricted to rows owned by one of `tenant_ids`. The restriction is
    /// part of the query, so ordering and paging only see visible rows.
    async fn read_in_tenants(
        pool: &PgPool,
        params: &HashMap<String, String>,
        tenant_ids: &[i32],
    ) -> Result<Vec<Self>, ApiError>
    where
        Self: Sized;

    /// A resource without a tenant is never authorized.
    async fn is_tenant_authorized(&self, user: &CurrentUser, pool: &PgPool) -> Result<bool, ApiError> {
        match self.tenant_id() {
            Some(tenant_id) => crate::tenant::is_resource_authorized_to_user(pool, tenant_id, user).await,
            None => {
                tracing::debug!(user = %user.user_name, "resource has no tenant");
                Ok(false)
            }
        }
    }
}

/// Key required for update/delete; a resource without one cannot be targeted.
pub fn require_keys<R: Identifier>(resource: &R) -> Result<R::Keys, ApiError> {
    resource
        .keys()
        .ok_or_else(|| ApiError::validation(format!("{} key is required", R::DISPLAY_NAME)))
}

/// Every resource kind exposed through the generic surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    DeliveryService,
    PhysLocation,
    Region,
    Parameter,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::DeliveryService,
        ResourceKind::PhysLocation,
        ResourceKind::Region,
        ResourceKind::Parameter,
    ];

    pub fn path_segment(self) -> &'static str {
        match self {
            ResourceKind::DeliveryService => "deliveryservices",
            ResourceKind::PhysLocation => "phys_locations",
            ResourceKind::Region => "regions",
            ResourceKind::Parameter => "parameters",
        }
    }

    pub fn type_name(self) -> &'static str {
        use crate::resources::{DeliveryService, Parameter, PhysLocation, Region};
        match self {
            ResourceKind::DeliveryService => DeliveryService::TYPE_NAME,
            ResourceKind::PhysLocation => PhysLocation::TYPE_NAME,
            ResourceKind::Region => Region::TYPE_NAME,
            ResourceKind::Parameter => Parameter::TYPE_NAME,
        }
    }

    /// Writes to tenant-scoped kinds pass the tenancy check first.
    pub fn is_tenant_scoped(self) -> bool {
        matches!(self, ResourceKind::DeliveryService)
    }
}
