//! Regions: named groupings of physical locations within a division.

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

const SELECT_REGIONS: &str = r#"SELECT
r.division,
d.name AS division_name,
r.id,
r.last_updated,
r.name
FROM region r
JOIN division d ON r.division = d.id"#;

const INSERT_REGION: &str = r#"INSERT INTO region (division, name)
VALUES ($1, $2)
RETURNING id, last_updated"#;

const UPDATE_REGION: &str = r#"UPDATE region SET
division = $1,
name = $2,
last_updated = now()
WHERE id = $3
RETURNING last_updated"#;

const DELETE_REGION: &str = "DELETE FROM region WHERE id = $1";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub division: Option<i32>,
    pub division_name: Option<String>,
    pub id: Option<i32>,
    pub last_updated: Option<DateTime<Utc>>,
    pub name: Option<String>,
}

fn filter_spec() -> FilterSpec {
    FilterSpec::from([
        ("division", WhereColumn::checked("r.division", is_int)),
        ("id", WhereColumn::checked("r.id", is_int)),
        ("name", WhereColumn::new("r.name")),
    ])
}

impl Identifier for Region {
    type Keys = IdKey;
    const TYPE_NAME: &'static str = "region";
    const DISPLAY_NAME: &'static str = "region";

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
impl Validator for Region {
    async fn validate(&self, _pool: &PgPool) -> Result<Vec<FieldError>, ApiError> {
        Ok(FieldChecks::new()
            .required_str("name", self.name.as_deref())
            .required_int("division", self.division)
            .min("division", self.division, 1)
            .finish())
    }
}

#[async_trait]
impl Reader for Region {
    async fn read(
        pool: &PgPool,
        params: &HashMap<String, String>,
        _user: &CurrentUser,
    ) -> Result<Vec<Self>, ApiError> {
        super::read_rows(pool, Self::DISPLAY_NAME, SELECT_REGIONS, None, &filter_spec(), params).await
    }
}

#[async_trait]
impl Creator for Region {
    async fn create(&mut self, pool: &PgPool, _user: &CurrentUser) -> Result<(), ApiError> {
        let query = sqlx::query_as::<_, Written>(INSERT_REGION)
            .bind(self.division)
            .bind(self.name.as_deref());
        let written = transaction::insert(pool, Self::DISPLAY_NAME, query).await?;
        self.set_keys(IdKey { id: written.id });
        self.last_updated = Some(written.last_updated);
        Ok(())
    }
}

#[async_trait]
impl Updater for Region {
    async fn update(&mut self, pool: &PgPool, _user: &CurrentUser) -> Result<(), ApiError> {
        let IdKey { id } = require_keys(self)?;
        let query = sqlx::query_as::<_, Stamp>(UPDATE_REGION)
            .bind(self.division)
            .bind(self.name.as_deref())
            .bind(id);
        let stamp = transaction::update(pool, Self::DISPLAY_NAME, query).await?;
        self.last_updated = Some(stamp.last_updated);
        Ok(())
    }
}

#[async_trait]
impl Deleter for Region {
    async fn delete(&self, pool: &PgPool, _user: &CurrentUser) -> Result<(), ApiError> {
        let IdKey { id } = require_keys(self)?;
        transaction::delete(pool, Self::DISPLAY_NAME, sqlx::query(DELETE_REGION).bind(id)).await
    }
}
