//! Email address fields.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::field::FieldCheck;

// Basic RFC 5322 shape: dot-separated atoms, a domain with at least one
// dot and an alphabetic TLD.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_+-]+(\.[a-zA-Z0-9_+-]+)*@([a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}$")
        .expect("email pattern compiles")
});

#[derive(Debug, Clone, Default)]
pub struct EmailValidator;

impl EmailValidator {
    pub fn new() -> Self {
        Self
    }

    /// mandatory → half-width → string shape → format match.
    pub fn check<'m, 'a>(&self, check: FieldCheck<'m, 'a>, mandatory: bool) -> FieldCheck<'m, 'a> {
        let mut check = check.mandatory(mandatory).half_width().string_shape();
        if check.is_skip() {
            return check;
        }
        let malformed = check
            .value()
            .as_str()
            .is_some_and(|text| !EMAIL_RE.is_match(text));
        if malformed {
            let label = check.label();
            check.record_error(format!("{label} does not match the email address format"));
        }
        check
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Subject;
    use crate::results::Results;
    use kiroku_orm::{model_field_set, FieldDef, FieldSet, LogicalType, Row, StorageType};
    use serde_json::json;

    static FIELDS: Lazy<FieldSet> = Lazy::new(|| {
        model_field_set(vec![FieldDef::new(
            "email",
            "email",
            "メールアドレス",
            LogicalType::String,
            StorageType::VarChar,
        )
        .bounds(4, 50)])
    });

    fn validate(value: &str) -> bool {
        let mut results = Results::new();
        let mut data = Row::new();
        data.insert("email".to_string(), json!(value));
        let mut subject = Subject::row(&mut data, &FIELDS);
        EmailValidator::new()
            .check(FieldCheck::start(&mut subject, "email", &mut results), true)
            .end()
    }

    #[test]
    fn accepts_common_addresses() {
        assert!(validate("a@example.com"));
        assert!(validate("first.last+tag@sub.example.co.jp"));
        assert!(validate("user_name@example-domain.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!validate("plain"));
        assert!(!validate("missing@domain"));
        assert!(!validate("@example.com"));
        assert!(!validate("two@@example.com"));
        assert!(!validate("dot.@example.com"));
    }

    #[test]
    fn full_width_input_normalizes_first() {
        let mut results = Results::new();
        let mut data = Row::new();
        data.insert("email".to_string(), json!("ａ@ｅｘａｍｐｌｅ.com"));
        let mut subject = Subject::row(&mut data, &FIELDS);
        let ok = EmailValidator::new()
            .check(FieldCheck::start(&mut subject, "email", &mut results), true)
            .end();
        assert!(ok);
        assert_eq!(data.get("email"), Some(&json!("a@example.com")));
    }
}
