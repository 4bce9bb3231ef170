//! Typed bind values for filter predicates.

use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;

/// A filter value ready to bind. Produced by a column's check, or `Text` when the column has none.
/// `IntList` only comes from server-side restrictions such as the tenancy predicate.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    Text(String),
    Int(i64),
    Bool(bool),
    IntList(Vec<i32>),
}

/// Validates a raw query-parameter value and converts it to its bind type.
pub type ParamCheck = fn(&str) -> Result<FilterValue, String>;

pub fn is_int(raw: &str) -> Result<FilterValue, String> {
    raw.trim()
        .parse::<i64>()
        .map(FilterValue::Int)
        .map_err(|_| "cannot parse to integer".to_string())
}

pub fn is_bool(raw: &str) -> Result<FilterValue, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(FilterValue::Bool(true)),
        "false" | "f" | "0" => Ok(FilterValue::Bool(false)),
        _ => Err("cannot parse to boolean".to_string()),
    }
}

/// Bind filter values to a query in placeholder order.
pub fn bind_filter_values<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    values: &'q [FilterValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for v in values {
        query = match v {
            FilterValue::Text(s) => query.bind(s.as_str()),
            FilterValue::Int(n) => query.bind(*n),
            FilterValue::Bool(b) => query.bind(*b),
            FilterValue::IntList(ids) => query.bind(ids.as_slice()),
        };
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_int_accepts_integers_only() {
        assert_eq!(is_int("42"), Ok(FilterValue::Int(42)));
        assert_eq!(is_int(" -7 "), Ok(FilterValue::Int(-7)));
        assert_eq!(is_int("4.2"), Err("cannot parse to integer".to_string()));
        assert!(is_int("1; DROP TABLE region").is_err());
    }

    #[test]
    fn is_bool_accepts_common_spellings() {
        assert_eq!(is_bool("TRUE"), Ok(FilterValue::Bool(true)));
        assert_eq!(is_bool("f"), Ok(FilterValue::Bool(false)));
        assert_eq!(is_bool("0"), Ok(FilterValue::Bool(false)));
        assert!(is_bool("yes please").is_err());
    }
}
