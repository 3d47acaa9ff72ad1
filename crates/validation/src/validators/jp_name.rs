//! Full-width Japanese name fields.
//!
//! Values normalize to full-width first, so half-width input like
//! `1-1` in an address becomes `１－１` before the symbol restriction
//! is applied. Full-width hyphen and period stay allowed.

use crate::field::FieldCheck;
use crate::width::{contains_any, ZEN_SYM_STRICT};

#[derive(Debug, Clone, Default)]
pub struct JpNameValidator;

impl JpNameValidator {
    pub fn new() -> Self {
        Self
    }

    /// mandatory → full-width → string shape → symbol restriction.
    pub fn check<'m, 'a>(&self, check: FieldCheck<'m, 'a>, mandatory: bool) -> FieldCheck<'m, 'a> {
        let mut check = check.mandatory(mandatory).full_width().string_shape();
        if check.is_skip() {
            return check;
        }
        let has_symbols = check
            .value()
            .as_str()
            .is_some_and(|text| contains_any(text, ZEN_SYM_STRICT) > 0);
        if has_symbols {
            let label = check.label();
            check.record_error(format!(
                "{label} may not contain symbols other than hyphen and period"
            ));
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
    use once_cell::sync::Lazy;
    use serde_json::json;

    static FIELDS: Lazy<FieldSet> = Lazy::new(|| {
        model_field_set(vec![FieldDef::new(
            "address",
            "address",
            "住所",
            LogicalType::String,
            StorageType::VarChar,
        )
        .bounds(3, 200)])
    });

    fn run(value: &str) -> (bool, Row) {
        let mut results = Results::new();
        let mut data = Row::new();
        data.insert("address".to_string(), json!(value));
        let mut subject = Subject::row(&mut data, &FIELDS);
        let ok = JpNameValidator::new()
            .check(
                FieldCheck::start(&mut subject, "address", &mut results),
                true,
            )
            .end();
        (ok, data)
    }

    #[test]
    fn half_width_digits_and_hyphen_normalize_and_pass() {
        let (ok, data) = run("東京都千代田区1-1");
        assert!(ok);
        assert_eq!(data.get("address"), Some(&json!("東京都千代田区１－１")));
    }

    #[test]
    fn kana_names_pass_untouched() {
        let (ok, data) = run("テスト会社");
        assert!(ok);
        assert_eq!(data.get("address"), Some(&json!("テスト会社")));
    }

    #[test]
    fn symbols_outside_the_exemptions_fail() {
        let (ok, _) = run("東京都千代田区1-1@ビル");
        assert!(!ok);
        let (ok, _) = run("住所（仮）");
        assert!(!ok);
    }
}
