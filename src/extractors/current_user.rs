//! Identity of the caller, as asserted by the upstream authenticator in request headers.

use crate::error::ApiError;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};

pub const USER_NAME_HEADER: &str = "X-User-Name";
pub const USER_ID_HEADER: &str = "X-User-Id";
pub const PRIV_LEVEL_HEADER: &str = "X-Priv-Level";
pub const TENANT_ID_HEADER: &str = "X-Tenant-Id";

pub const PRIV_LEVEL_READ_ONLY: i32 = 10;
pub const PRIV_LEVEL_OPERATIONS: i32 = 20;
pub const PRIV_LEVEL_ADMIN: i32 = 30;

/// Already-authenticated caller. Never constructed from untrusted input without the upstream check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_name: String,
    pub id: i32,
    pub priv_level: i32,
    pub tenant_id: Option<i32>,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.priv_level >= PRIV_LEVEL_ADMIN
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let user_name = header_str(headers, USER_NAME_HEADER)
            .ok_or_else(|| ApiError::Forbidden("no authenticated user".into()))?;
        Ok(CurrentUser {
            user_name: user_name.to_string(),
            id: header_int(headers, USER_ID_HEADER)?.unwrap_or(0),
            priv_level: header_int(headers, PRIV_LEVEL_HEADER)?.unwrap_or(PRIV_LEVEL_READ_ONLY),
            tenant_id: header_int(headers, TENANT_ID_HEADER)?,
        })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn header_int(headers: &HeaderMap, name: &str) -> Result<Option<i32>, ApiError> {
    header_str(headers, name)
        .map(|s| {
            s.parse::<i32>()
                .map_err(|_| ApiError::Forbidden(format!("malformed {} header", name)))
        })
        .transpose()
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        CurrentUser::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_all_identity_headers() {
        let mut h = HeaderMap::new();
        h.insert(USER_NAME_HEADER, HeaderValue::from_static("ops"));
        h.insert(USER_ID_HEADER, HeaderValue::from_static("7"));
        h.insert(PRIV_LEVEL_HEADER, HeaderValue::from_static("30"));
        h.insert(TENANT_ID_HEADER, HeaderValue::from_static("2"));
        let user = CurrentUser::from_headers(&h).unwrap();
        assert_eq!(user.user_name, "ops");
        assert_eq!(user.id, 7);
        assert!(user.is_admin());
        assert_eq!(user.tenant_id, Some(2));
    }

    #[test]
    fn missing_user_is_forbidden() {
        let err = CurrentUser::from_headers(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn defaults_to_read_only_without_tenant() {
        let mut h = HeaderMap::new();
        h.insert(USER_NAME_HEADER, HeaderValue::from_static("viewer"));
        let user = CurrentUser::from_headers(&h).unwrap();
        assert_eq!(user.priv_level, PRIV_LEVEL_READ_ONLY);
        assert_eq!(user.tenant_id, None);
        assert!(!user.is_admin());
    }

    #[test]
    fn malformed_tenant_header_is_rejected() {
        let mut h = HeaderMap::new();
        h.insert(USER_NAME_HEADER, HeaderValue::from_static("x"));
        h.insert(TENANT_ID_HEADER, HeaderValue::from_static("root"));
        assert!(CurrentUser::from_headers(&h).is_err());
    }
}
