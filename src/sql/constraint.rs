//! Classifies database write failures into conflicts versus system errors.

use crate::error::ApiErrorType;
use regex::Regex;
use sqlx::postgres::PgDatabaseError;
use std::sync::OnceLock;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn unique_detail() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Key \((.+)\)=\((.+)\) already exists").expect("static regex"))
}

fn missing_reference_detail() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"Key \((.+)\)=\((.+)\) is not present in table "(.+)""#).expect("static regex")
    })
}

fn still_referenced_detail() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"Key \((.+)\)=\((.+)\) is still referenced from table "(.+)""#).expect("static regex")
    })
}

/// Returns a short description of the offending field and the error category.
///
/// Unique and foreign-key violations with a parseable detail are `DataConflict`;
/// everything else is `SystemError` with no description.
pub fn classify(err: &sqlx::Error) -> (Option<String>, ApiErrorType) {
    let sqlx::Error::Database(db_err) = err else {
        return (None, ApiErrorType::SystemError);
    };
    let code = db_err.code();
    let detail = db_err
        .try_downcast_ref::<PgDatabaseError>()
        .and_then(|e| e.detail());
    let description = match (code.as_deref(), detail) {
        (Some(UNIQUE_VIOLATION), Some(d)) => parse_unique_detail(d),
        (Some(FOREIGN_KEY_VIOLATION), Some(d)) => parse_foreign_key_detail(d),
        _ => None,
    };
    match description {
        Some(d) => (Some(d), ApiErrorType::DataConflict),
        None => {
            if code.is_some() {
                tracing::debug!(code = ?code, detail = ?detail, "constraint detail not classified");
            }
            (None, ApiErrorType::SystemError)
        }
    }
}

/// `Key (name)=(West) already exists.` -> `name West already exists`
pub fn parse_unique_detail(detail: &str) -> Option<String> {
    let caps = unique_detail().captures(detail)?;
    Some(format!("{} {} already exists", &caps[1], &caps[2]))
}

/// Foreign-key details from both directions: a missing parent on insert/update, or a
/// parent still referenced on delete.
pub fn parse_foreign_key_detail(detail: &str) -> Option<String> {
    if let Some(caps) = missing_reference_detail().captures(detail) {
        return Some(format!("{} {} references a missing {}", &caps[1], &caps[2], &caps[3]));
    }
    let caps = still_referenced_detail().captures(detail)?;
    Some(format!("{} {} is still referenced by {}", &caps[1], &caps[2], &caps[3]))
}
