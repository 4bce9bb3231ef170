//! Configuration parameters with the profiles that reference them.
//!
//! Reads aggregate profile names into `profiles`. Secure values are masked for users below
//! admin privilege.

use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::resource::{
    require_keys, Creator, Deleter, IdKey, Identifier, KeyFieldInfo, KeyMap, Reader, Updater, Validator,
};
use crate::service::{transaction, FieldChecks, FieldError, Stamp, Written};
use crate::sql::{is_bool, is_int, FilterSpec, WhereColumn};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;

/// Shown in place of a secure value to callers below admin privilege.
pub const SECURE_VALUE_MASK: &str = "********";

const SELECT_PARAMETERS: &str = r#"SELECT
p.config_file,
p.id,
p.last_updated,
p.name,
COALESCE(array_remove(array_agg(pr.name ORDER BY pr.name), NULL), ARRAY[]::text[]) AS profiles,
p.secure,
p.value
FROM parameter p
LEFT JOIN profile_parameter pp ON pp.parameter = p.id
LEFT JOIN profile pr ON pp.profile = pr.id"#;

const GROUP_PARAMETERS: &str = "GROUP BY p.id";

const INSERT_PARAMETER: &str = r#"INSERT INTO parameter (config_file, name, secure, value)
VALUES ($1, $2, $3, $4)
RETURNING id, last_updated"#;

const UPDATE_PARAMETER: &str = r#"UPDATE parameter SET
config_file = $1,
name = $2,
secure = $3,
value = $4,
last_updated = now()
WHERE id = $5
RETURNING last_updated"#;

const DELETE_PARAMETER: &str = "DELETE FROM parameter WHERE id = $1";

/// A named configuration value destined for a config file on cache servers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub config_file: Option<String>,
    pub id: Option<i32>,
    pub last_updated: Option<DateTime<Utc>>,
    pub name: Option<String>,
    /// Names of the profiles using this parameter. Read-only.
    #[serde(default, skip_deserializing)]
    pub profiles: Option<Vec<String>>,
    pub secure: Option<bool>,
    pub value: Option<String>,
}

fn filter_spec() -> FilterSpec {
    FilterSpec::from([
        ("configFile", WhereColumn::new("p.config_file")),
        ("id", WhereColumn::checked("p.id", is_int)),
        ("name", WhereColumn::new("p.name")),
        ("secure", WhereColumn::checked("p.secure", is_bool)),
        ("value", WhereColumn::new("p.value")),
    ])
}

impl Parameter {
    fn mask_for(&mut self, user: &CurrentUser) {
        if self.secure == Some(true) && !user.is_admin() {
            self.value = Some(SECURE_VALUE_MASK.to_string());
        }
    }
}

impl Identifier for Parameter {
    type Keys = IdKey;
    const TYPE_NAME: &'static str = "param";
    const DISPLAY_NAME: &'static str = "parameter";

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
impl Validator for Parameter {
    async fn validate(&self, _pool: &PgPool) -> Result<Vec<FieldError>, ApiError> {
        Ok(FieldChecks::new()
            .required_str("name", self.name.as_deref())
            .required_str("configFile", self.config_file.as_deref())
            .required_str("value", self.value.as_deref())
            .finish())
    }
}

#[async_trait]
impl Reader for Parameter {
    async fn read(
        pool: &PgPool,
        params: &HashMap<String, String>,
        user: &CurrentUser,
    ) -> Result<Vec<Self>, ApiError> {
        let mut rows: Vec<Self> = super::read_rows(
            pool,
            Self::DISPLAY_NAME,
            SELECT_PARAMETERS,
            Some(GROUP_PARAMETERS),
            &filter_spec(),
            params,
        )
        .await?;
        rows.iter_mut().for_each(|p| p.mask_for(user));
        Ok(rows)
    }
}

#[async_trait]
impl Creator for Parameter {
    async fn create(&mut self, pool: &PgPool, _user: &CurrentUser) -> Result<(), ApiError> {
        let query = sqlx::query_as::<_, Written>(INSERT_PARAMETER)
            .bind(self.config_file.as_deref())
            .bind(self.name.as_deref())
            .bind(self.secure.unwrap_or(false))
            .bind(self.value.as_deref());
        let written = transaction::insert(pool, Self::DISPLAY_NAME, query).await?;
        self.set_keys(IdKey { id: written.id });
        self.last_updated = Some(written.last_updated);
        Ok(())
    }
}

#[async_trait]
impl Updater for Parameter {
    async fn update(&mut self, pool: &PgPool, _user: &CurrentUser) -> Result<(), ApiError> {
        let IdKey { id } = require_keys(self)?;
        let query = sqlx::query_as::<_, Stamp>(UPDATE_PARAMETER)
            .bind(self.config_file.as_deref())
            .bind(self.name.as_deref())
            .bind(self.secure.unwrap_or(false))
            .bind(self.value.as_deref())
            .bind(id);
        let stamp = transaction::update(pool, Self::DISPLAY_NAME, query).await?;
        self.last_updated = Some(stamp.last_updated);
        Ok(())
    }
}

#[async_trait]
impl Deleter for Parameter {
    async fn delete(&self, pool: &PgPool, _user: &CurrentUser) -> Result<(), ApiError> {
        let IdKey { id } = require_keys(self)?;
        transaction::delete(pool, Self::DISPLAY_NAME, sqlx::query(DELETE_PARAMETER).bind(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{PRIV_LEVEL_ADMIN, PRIV_LEVEL_OPERATIONS};

    fn user(priv_level: i32) -> CurrentUser {
        CurrentUser {
            user_name: "ops".into(),
            id: 1,
            priv_level,
            tenant_id: None,
        }
    }

    fn secret() -> Parameter {
        Parameter {
            name: Some("api_key".into()),
            config_file: Some("global".into()),
            secure: Some(true),
            value: Some("hunter2".into()),
            ..Default::default()
        }
    }

    #[test]
    fn secure_values_are_masked_below_admin() {
        let mut p = secret();
        p.mask_for(&user(PRIV_LEVEL_OPERATIONS));
        assert_eq!(p.value.as_deref(), Some(SECURE_VALUE_MASK));
    }

    #[test]
    fn admins_see_secure_values() {
        let mut p = secret();
        p.mask_for(&user(PRIV_LEVEL_ADMIN));
        assert_eq!(p.value.as_deref(), Some("hunter2"));
    }

    #[test]
    fn profiles_are_not_accepted_from_clients() {
        let p: Parameter =
            serde_json::from_str(r#"{"name":"a","configFile":"b","value":"c","profiles":["edge"]}"#).unwrap();
        assert_eq!(p.profiles, None);
    }

    #[test]
    fn secure_filter_must_be_boolean() {
        let params = HashMap::from([("secure".to_string(), "maybe".to_string())]);
        let errs = crate::sql::build_where_and_order_by(&params, &filter_spec()).unwrap_err();
        assert_eq!(errs, vec!["secure: cannot parse to boolean".to_string()]);
    }
}
