//! Physical locations (data centers and POPs), each belonging to a region.
//!
//! Reads carry the region name alongside `regionId`.

use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::resource::{
    require_keys, Creator, Deleter, IdKey, Identifier, KeyFieldInfo, KeyMap, Reader, Updater, Validator,
};
use crate::service::{transaction, FieldChecks, FieldError, Stamp, Written};
use crate::sql::{is_int, FilterSpec, WhereColumn};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;

const SELECT_PHYS_LOCATIONS: &str = r#"SELECT
pl.address,
pl.city,
pl.comments,
pl.email,
pl.id,
pl.last_updated,
pl.name,
pl.phone,
pl.poc,
pl.region AS region_id,
r.name AS region,
pl.short_name,
pl.state,
pl.zip
FROM phys_location pl
JOIN region r ON pl.region = r.id"#;

const INSERT_PHYS_LOCATION: &str = r#"INSERT INTO phys_location (
address, city, comments, email, name, phone, poc, region, short_name, state, zip
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
RETURNING id, last_updated"#;

const UPDATE_PHYS_LOCATION: &str = r#"UPDATE phys_location SET
address = $1,
city = $2,
comments = $3,
email = $4,
name = $5,
phone = $6,
poc = $7,
region = $8,
short_name = $9,
state = $10,
zip = $11,
last_updated = now()
WHERE id = $12
RETURNING last_updated"#;

const DELETE_PHYS_LOCATION: &str = "DELETE FROM phys_location WHERE id = $1";

/// A physical site (data center, point of presence) within a region.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PhysLocation {
    pub address: Option<String>,
    pub city: Option<String>,
    pub comments: Option<String>,
    pub email: Option<String>,
    pub id: Option<i32>,
    pub last_updated: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub poc: Option<String>,
    pub region_id: Option<i32>,
    /// Region name, filled on read.
    pub region: Option<String>,
    pub short_name: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

fn filter_spec() -> FilterSpec {
    FilterSpec::from([
        ("id", WhereColumn::checked("pl.id", is_int)),
        ("name", WhereColumn::new("pl.name")),
        ("region", WhereColumn::checked("pl.region", is_int)),
    ])
}

impl PhysLocation {
    fn bind_fields<'q, O>(
        &'q self,
        query: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    ) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
        query
            .bind(self.address.as_deref())
            .bind(self.city.as_deref())
            .bind(self.comments.as_deref())
            .bind(self.email.as_deref())
            .bind(self.name.as_deref())
            .bind(self.phone.as_deref())
            .bind(self.poc.as_deref())
            .bind(self.region_id)
            .bind(self.short_name.as_deref())
            .bind(self.state.as_deref())
            .bind(self.zip.as_deref())
    }
}

impl Identifier for PhysLocation {
    type Keys = IdKey;
    const TYPE_NAME: &'static str = "physLocation";
    const DISPLAY_NAME: &'static str = "physLocation";

    fn key_fields() -> &'static [KeyFieldInfo] {
        IdKey::FIELDS
    }

    fn keys_from_map(map: &KeyMap) -> Option<IdKey> {
        IdKey::from_map(map)
    }

    fn keys(&self) -> Option<IdKey> {
        self.id.map(|id| IdKey { id })
    }

    fn set_keys(&mut self, keys: IdKey) {
        self.id = Some(keys.id);
    }

    fn audit_name(&self) -> String {
        self.name.clone().unwrap_or_default()
    }
}

#[async_trait]
impl Validator for PhysLocation {
    async fn validate(&self, _pool: &PgPool) -> Result<Vec<FieldError>, ApiError> {
        Ok(FieldChecks::new()
            .required_str("address", self.address.as_deref())
            .required_str("city", self.city.as_deref())
            .required_str("name", self.name.as_deref())
            .not_nil("regionId", self.region_id.as_ref())
            .min("regionId", self.region_id, 0)
            .required_str("shortName", self.short_name.as_deref())
            .required_str("state", self.state.as_deref())
            .required_str("zip", self.zip.as_deref())
            .finish())
    }
}

#[async_trait]
impl Reader for PhysLocation {
    async fn read(
        pool: &PgPool,
        params: &HashMap<String, String>,
        _user: &CurrentUser,
    ) -> Result<Vec<Self>, ApiError> {
        super::read_rows(pool, Self::DISPLAY_NAME, SELECT_PHYS_LOCATIONS, None, &filter_spec(), params).await
    }
}

#[async_trait]
impl Creator for PhysLocation {
    async fn create(&mut self, pool: &PgPool, _user: &CurrentUser) -> Result<(), ApiError> {
        let query = self.bind_fields(sqlx::query_as::<_, Written>(INSERT_PHYS_LOCATION));
        let written = transaction::insert(pool, Self::DISPLAY_NAME, query).await?;
        self.set_keys(IdKey { id: written.id });
        self.last_updated = Some(written.last_updated);
        Ok(())
    }
}

#[async_trait]
impl Updater for PhysLocation {
    async fn update(&mut self, pool: &PgPool, _user: &CurrentUser) -> Result<(), ApiError> {
        let IdKey { id } = require_keys(self)?;
        let query = self.bind_fields(sqlx::query_as::<_, Stamp>(UPDATE_PHYS_LOCATION)).bind(id);
        let stamp = transaction::update(pool, Self::DISPLAY_NAME, query).await?;
        self.last_updated = Some(stamp.last_updated);
        Ok(())
    }
}

#[async_trait]
impl Deleter for PhysLocation {
    async fn delete(&self, pool: &PgPool, _user: &CurrentUser) -> Result<(), ApiError> {
        let IdKey { id } = require_keys(self)?;
        transaction::delete(pool, Self::DISPLAY_NAME, sqlx::query(DELETE_PHYS_LOCATION).bind(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::to_messages;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool")
    }

    fn denver() -> PhysLocation {
        PhysLocation {
            address: Some("1234 Mile High Circle".into()),
            city: Some("Denver".into()),
            name: Some("Denver".into()),
            region_id: Some(1),
            short_name: Some("den".into()),
            state: Some("CO".into()),
            zip: Some("80202".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn complete_location_is_valid() {
        assert!(denver().validate(&lazy_pool()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn region_zero_is_allowed_but_negative_is_not() {
        let pool = lazy_pool();
        let zero = PhysLocation {
            region_id: Some(0),
            ..denver()
        };
        assert!(zero.validate(&pool).await.unwrap().is_empty());
        let negative = PhysLocation {
            region_id: Some(-1),
            ..denver()
        };
        assert_eq!(
            to_messages(&negative.validate(&pool).await.unwrap()),
            vec!["regionId: must be no less than 0".to_string()]
        );
    }

    #[tokio::test]
    async fn missing_fields_are_all_reported() {
        let errs = PhysLocation::default().validate(&lazy_pool()).await.unwrap();
        let fields: Vec<_> = errs.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["address", "city", "name", "regionId", "shortName", "state", "zip"]
        );
    }

    #[test]
    fn region_id_and_region_name_are_distinct_on_the_wire() {
        let pl: PhysLocation = serde_json::from_str(r#"{"regionId":2,"region":"West"}"#).unwrap();
        assert_eq!(pl.region_id, Some(2));
        assert_eq!(pl.region.as_deref(), Some("West"));
        assert_eq!(pl.audit_name(), "");
    }
}
