//! Field-level validation. Collects every violation, at most one message per field.

use regex::Regex;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Rule applied to a present string value.
pub type StringRule = fn(&str) -> Result<(), String>;

/// Accumulates field errors. The first failing rule of a field wins.
#[derive(Debug, Default)]
pub struct FieldChecks {
    errors: Vec<FieldError>,
}

impl FieldChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(mut self, field: &'static str, message: impl Into<String>) -> Self {
        if !self.has_error(field) {
            self.errors.push(FieldError {
                field,
                message: message.into(),
            });
        }
        self
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Present and not blank.
    pub fn required_str(self, field: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => self,
            _ => self.fail(field, "cannot be blank"),
        }
    }

    /// Present; any value including zero or false.
    pub fn not_nil<T>(self, field: &'static str, value: Option<&T>) -> Self {
        match value {
            Some(_) => self,
            None => self.fail(field, "is required"),
        }
    }

    /// Present and non-zero.
    pub fn required_int(self, field: &'static str, value: Option<i32>) -> Self {
        match value {
            Some(v) if v != 0 => self,
            _ => self.fail(field, "cannot be blank"),
        }
    }

    pub fn min(self, field: &'static str, value: Option<i32>, min: i32) -> Self {
        match value {
            Some(v) if v < min => self.fail(field, format!("must be no less than {}", min)),
            _ => self,
        }
    }

    /// Character length within `[min, max]`; absent values pass.
    pub fn length(self, field: &'static str, value: Option<&str>, min: usize, max: usize) -> Self {
        match value {
            Some(v) if !(min..=max).contains(&v.chars().count()) => {
                self.fail(field, format!("the length must be between {} and {}", min, max))
            }
            _ => self,
        }
    }

    pub fn check(self, field: &'static str, value: Option<&str>, rule: StringRule) -> Self {
        match value.map(rule) {
            Some(Err(message)) => self.fail(field, message),
            _ => self,
        }
    }

    /// Case-insensitive membership; absent values pass.
    pub fn one_of_icase(self, field: &'static str, value: Option<&str>, allowed: &[&str]) -> Self {
        match value {
            Some(v) if !allowed.iter().any(|a| a.eq_ignore_ascii_case(v)) => {
                let quoted: Vec<String> = allowed.iter().map(|a| format!("'{}'", a)).collect();
                self.fail(field, format!("must be one of {}", quoted.join(" or ")))
            }
            _ => self,
        }
    }

    pub fn finish(self) -> Vec<FieldError> {
        self.errors
    }
}

/// Flatten field errors into client messages.
pub fn to_messages(errors: &[FieldError]) -> Vec<String> {
    errors.iter().map(ToString::to_string).collect()
}

pub fn no_spaces(v: &str) -> Result<(), String> {
    if v.chars().any(char::is_whitespace) {
        Err("cannot contain spaces".into())
    } else {
        Ok(())
    }
}

pub fn no_periods(v: &str) -> Result<(), String> {
    if v.contains('.') {
        Err("cannot contain periods".into())
    } else {
        Ok(())
    }
}

fn hostname_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)(\.[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)*\.?$")
            .expect("static regex")
    })
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?i)([a-z][a-z0-9+.\-]*://)?(\[[0-9a-f:.]+\]|[a-z0-9]([a-z0-9\-]*[a-z0-9])?(\.[a-z0-9]([a-z0-9\-]*[a-z0-9])?)*)(:\d{1,5})?([/?#]\S*)?$")
            .expect("static regex")
    })
}

/// Hostname or IP address.
pub fn is_host(v: &str) -> Result<(), String> {
    if v.parse::<Ipv4Addr>().is_ok() || v.parse::<Ipv6Addr>().is_ok() || hostname_re().is_match(v) {
        Ok(())
    } else {
        Err("must be a valid hostname".into())
    }
}

pub fn is_url(v: &str) -> Result<(), String> {
    if !v.is_empty() && url_re().is_match(v) {
        Ok(())
    } else {
        Err("must be a valid URL".into())
    }
}

/// Either address family.
pub fn is_ip(v: &str) -> Result<(), String> {
    if v.parse::<Ipv4Addr>().is_ok() || v.parse::<Ipv6Addr>().is_ok() {
        Ok(())
    } else {
        Err("must be a valid IP address".into())
    }
}

pub fn is_ipv6(v: &str) -> Result<(), String> {
    v.parse::<Ipv6Addr>()
        .map(|_| ())
        .map_err(|_| "must be a valid IPv6 address".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_one_message_per_field() {
        let errs = FieldChecks::new()
            .required_str("name", Some(""))
            .length("name", Some(""), 1, 48)
            .required_int("division", None)
            .finish();
        assert_eq!(
            to_messages(&errs),
            vec!["name: cannot be blank".to_string(), "division: cannot be blank".to_string()]
        );
    }

    #[test]
    fn absent_values_pass_optional_rules() {
        let errs = FieldChecks::new()
            .length("xmlId", None, 1, 48)
            .check("infoUrl", None, is_url)
            .one_of_icase("deepCachingType", None, &["NEVER", "ALWAYS"])
            .min("dscp", None, 0)
            .finish();
        assert!(errs.is_empty());
    }

    #[test]
    fn not_nil_accepts_false_and_zero() {
        let errs = FieldChecks::new()
            .not_nil("active", Some(&false))
            .not_nil("dscp", Some(&0))
            .not_nil("logsEnabled", None::<&bool>)
            .finish();
        assert_eq!(to_messages(&errs), vec!["logsEnabled: is required".to_string()]);
    }

    #[test]
    fn min_and_length_messages() {
        let errs = FieldChecks::new()
            .min("typeId", Some(0), 1)
            .length("displayName", Some(&"x".repeat(49)), 1, 48)
            .finish();
        assert_eq!(
            to_messages(&errs),
            vec![
                "typeId: must be no less than 1".to_string(),
                "displayName: the length must be between 1 and 48".to_string()
            ]
        );
    }

    #[test]
    fn one_of_is_case_insensitive() {
        let allowed = ["NEVER", "ALWAYS"];
        assert!(FieldChecks::new().one_of_icase("d", Some("never"), &allowed).finish().is_empty());
        let errs = FieldChecks::new().one_of_icase("d", Some("sometimes"), &allowed).finish();
        assert_eq!(errs[0].message, "must be one of 'NEVER' or 'ALWAYS'");
    }

    #[test]
    fn string_rules() {
        assert!(no_spaces("ds-1").is_ok());
        assert!(no_spaces("ds 1").is_err());
        assert!(no_periods("ds-1").is_ok());
        assert!(no_periods("ds.1").is_err());
        assert!(is_host("cdn.example.com").is_ok());
        assert!(is_host("edge").is_ok());
        assert!(is_host("10.0.0.1").is_ok());
        assert!(is_host("bad_host!").is_err());
        assert!(is_url("http://origin.example.com/path").is_ok());
        assert!(is_url("origin.example.com").is_ok());
        assert!(is_url("not a url").is_err());
        assert!(is_ip("192.168.1.1").is_ok());
        assert!(is_ip("::1").is_ok());
        assert!(is_ip("300.1.1.1").is_err());
        assert!(is_ipv6("2001:db8::1").is_ok());
        assert!(is_ipv6("192.168.1.1").is_err());
    }
}
