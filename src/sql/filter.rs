//! Builds WHERE / ORDER BY / LIMIT fragments from untrusted query parameters.
//! Column expressions come only from the resource's filter spec; values are always bound.

use crate::sql::params::{FilterValue, ParamCheck};
use std::collections::{BTreeMap, HashMap};

/// Reserved parameter selecting the sort column (a filter spec key).
pub const ORDER_BY_PARAM: &str = "orderby";
pub const LIMIT_PARAM: &str = "limit";
pub const OFFSET_PARAM: &str = "offset";
pub const MAX_LIMIT: u32 = 1000;

/// Column expression for one externally visible filter key.
#[derive(Clone, Copy)]
pub struct WhereColumn {
    pub column: &'static str,
    pub check: Option<ParamCheck>,
}

impl WhereColumn {
    pub const fn new(column: &'static str) -> Self {
        WhereColumn { column, check: None }
    }

    pub const fn checked(column: &'static str, check: ParamCheck) -> Self {
        WhereColumn {
            column,
            check: Some(check),
        }
    }
}

/// Allow-list of filter keys for one resource type.
pub type FilterSpec = BTreeMap<&'static str, WhereColumn>;

/// Generated SQL fragments plus the values for their placeholders ($1..$n, in order).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WhereClause {
    pub where_clause: String,
    pub order_by: String,
    pub limit: String,
    pub values: Vec<FilterValue>,
}

impl WhereClause {
    /// Append the fragments to a base SELECT with no placeholders of its own.
    pub fn apply(&self, base: &str) -> String {
        format!("{}{}{}{}", base, self.where_clause, self.order_by, self.limit)
    }

    /// Like `apply`, with a GROUP BY between WHERE and ORDER BY.
    pub fn apply_grouped(&self, base: &str, group_by: &str) -> String {
        format!(
            "{}{}\n{}{}{}",
            base, self.where_clause, group_by, self.order_by, self.limit
        )
    }

    /// AND `column = ANY($n)` onto the predicate. Applies before ORDER BY and paging.
    pub fn and_any(&mut self, column: &str, ids: Vec<i32>) {
        self.values.push(FilterValue::IntList(ids));
        let predicate = format!("{} = ANY(${})", column, self.values.len());
        if self.where_clause.is_empty() {
            self.where_clause = format!("\nWHERE {}", predicate);
        } else {
            self.where_clause.push_str(&format!(" AND {}", predicate));
        }
    }
}

/// Build the predicate, ordering and paging for `params` against `spec`.
///
/// Keys that are neither in the spec nor reserved are ignored. Any rejected value or
/// unknown sort column is reported; callers must not run the query when errors are returned.
pub fn build_where_and_order_by(
    params: &HashMap<String, String>,
    spec: &FilterSpec,
) -> Result<WhereClause, Vec<String>> {
    let mut out = WhereClause::default();
    let mut errors = Vec::new();
    let mut predicates = Vec::new();

    for (key, col) in spec {
        let Some(raw) = params.get(*key) else { continue };
        let value = match col.check {
            Some(check) => match check(raw) {
                Ok(v) => v,
                Err(reason) => {
                    errors.push(format!("{}: {}", key, reason));
                    continue;
                }
            },
            None => FilterValue::Text(raw.clone()),
        };
        out.values.push(value);
        predicates.push(format!("{} = ${}", col.column, out.values.len()));
    }
    if !predicates.is_empty() {
        out.where_clause = format!("\nWHERE {}", predicates.join(" AND "));
    }

    if let Some(sort_key) = params.get(ORDER_BY_PARAM) {
        match spec.get(sort_key.as_str()) {
            Some(col) => out.order_by = format!("\nORDER BY {}", col.column),
            None => errors.push(format!("{}: unknown column '{}'", ORDER_BY_PARAM, sort_key)),
        }
    }

    let limit = parse_paging(params, LIMIT_PARAM, &mut errors).map(|n| n.min(MAX_LIMIT));
    let offset = parse_paging(params, OFFSET_PARAM, &mut errors);
    if let Some(n) = limit {
        out.limit.push_str(&format!("\nLIMIT {}", n));
    }
    if let Some(n) = offset {
        out.limit.push_str(&format!("\nOFFSET {}", n));
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

fn parse_paging(params: &HashMap<String, String>, key: &str, errors: &mut Vec<String>) -> Option<u32> {
    let raw = params.get(key)?;
    match raw.trim().parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(format!("{}: must be a non-negative integer", key));
            None
        }
    }
}
