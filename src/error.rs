//! Classified errors and their HTTP mapping.

use crate::response::Alerts;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Outcome category of a resource operation. Every Create/Update/Delete ends in exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiErrorType {
    NoError,
    SystemError,
    ValidationError,
    DataConflict,
    DataMissing,
    Forbidden,
    PayloadTooLarge,
}

impl ApiErrorType {
    /// Category of a finished operation: `NoError` for `Ok`, the error's category otherwise.
    pub fn of<T>(result: &Result<T, ApiError>) -> Self {
        match result {
            Ok(_) => ApiErrorType::NoError,
            Err(e) => e.category(),
        }
    }

    pub fn status_code(self) -> StatusCode {
        match self {
            ApiErrorType::NoError => StatusCode::OK,
            ApiErrorType::SystemError => StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorType::ValidationError => StatusCode::BAD_REQUEST,
            ApiErrorType::DataConflict => StatusCode::CONFLICT,
            ApiErrorType::DataMissing => StatusCode::NOT_FOUND,
            ApiErrorType::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorType::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApiErrorType::NoError => "no error",
            ApiErrorType::SystemError => "system error",
            ApiErrorType::ValidationError => "validation error",
            ApiErrorType::DataConflict => "data conflict",
            ApiErrorType::DataMissing => "data missing",
            ApiErrorType::Forbidden => "forbidden",
            ApiErrorType::PayloadTooLarge => "payload too large",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Message sent to clients for any database failure; details only go to the log.
pub const DB_ERROR_MESSAGE: &str = "database access error";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    DataMissing(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("system: {0}")]
    System(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(vec![message.into()])
    }

    pub fn category(&self) -> ApiErrorType {
        match self {
            ApiError::Validation(_) => ApiErrorType::ValidationError,
            ApiError::Conflict(_) => ApiErrorType::DataConflict,
            ApiError::DataMissing(_) => ApiErrorType::DataMissing,
            ApiError::Forbidden(_) => ApiErrorType::Forbidden,
            ApiError::PayloadTooLarge(_) => ApiErrorType::PayloadTooLarge,
            ApiError::System(_) | ApiError::Db(_) | ApiError::Config(_) => ApiErrorType::SystemError,
        }
    }

    /// Client-facing messages, one per alert.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ApiError::Validation(errs) => errs.clone(),
            ApiError::Conflict(m)
            | ApiError::DataMissing(m)
            | ApiError::Forbidden(m)
            | ApiError::PayloadTooLarge(m)
            | ApiError::System(m) => vec![m.clone()],
            ApiError::Db(_) => vec![DB_ERROR_MESSAGE.to_string()],
            ApiError::Config(e) => vec![e.to_string()],
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.category().status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(Alerts::errors(self.messages()))).into_response()
    }
}
