//! Half-width name fields: letters, digits, hyphen and period only.

use crate::field::FieldCheck;
use crate::width::{contains_any, HAN_SYM_STRICT};

#[derive(Debug, Clone, Default)]
pub struct AsciiNameValidator;

impl AsciiNameValidator {
    pub fn new() -> Self {
        Self
    }

    /// mandatory → half-width → string shape → symbol restriction.
    pub fn check<'m, 'a>(&self, check: FieldCheck<'m, 'a>, mandatory: bool) -> FieldCheck<'m, 'a> {
        let mut check = check.mandatory(mandatory).half_width().string_shape();
        if check.is_skip() {
            return check;
        }
        let has_symbols = check
            .value()
            .as_str()
            .is_some_and(|text| contains_any(text, HAN_SYM_STRICT) > 0);
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
            "name",
            "name",
            "ユーザ名",
            LogicalType::String,
            StorageType::VarChar,
        )
        .bounds(4, 20)])
    });

    fn validate(value: &str) -> bool {
        let mut results = Results::new();
        let mut data = Row::new();
        data.insert("name".to_string(), json!(value));
        let mut subject = Subject::row(&mut data, &FIELDS);
        AsciiNameValidator::new()
            .check(FieldCheck::start(&mut subject, "name", &mut results), true)
            .end()
    }

    #[test]
    fn hyphen_and_period_are_allowed() {
        assert!(validate("taro.yamada"));
        assert!(validate("log-in01"));
    }

    #[test]
    fn other_symbols_are_rejected() {
        assert!(!validate("taro@yamada"));
        assert!(!validate("user_name"));
        assert!(!validate("semi;colon"));
    }
}
