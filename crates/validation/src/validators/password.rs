//! Password fields: composition requirements plus a one-way hash.

use serde_json::Value;

use crate::field::FieldCheck;
use crate::width::{contains_any, HAN_ALPH, HAN_NUM, HAN_SYM};

#[derive(Debug, Clone, Default)]
pub struct PasswordValidator;

impl PasswordValidator {
    pub fn new() -> Self {
        Self
    }

    /// mandatory → half-width → string shape → composition. A password
    /// must contain at least one letter, one digit and one symbol; a
    /// value that passed every check for this field is replaced by its
    /// bcrypt hash before write-back.
    pub fn check<'m, 'a>(&self, check: FieldCheck<'m, 'a>, mandatory: bool) -> FieldCheck<'m, 'a> {
        let mut check = check.mandatory(mandatory).half_width().string_shape();
        if check.is_skip() || check.value().is_null() {
            return check;
        }
        let Some(text) = check.value().as_str().map(str::to_string) else {
            return check;
        };
        let label = check.label();
        if contains_any(&text, HAN_ALPH) == 0 {
            check.record_error(format!("{label} must contain at least one letter"));
        }
        if contains_any(&text, HAN_NUM) == 0 {
            check.record_error(format!("{label} must contain at least one digit"));
        }
        if contains_any(&text, HAN_SYM) == 0 {
            check.record_error(format!("{label} must contain at least one symbol"));
        }
        if !check.field_failed() {
            match bcrypt::hash(&text, bcrypt::DEFAULT_COST) {
                Ok(hash) => check.set_value(Value::String(hash)),
                Err(error) => {
                    tracing::error!(%error, "password hashing failed");
                    check.record_error(format!("{label} could not be hashed"));
                }
            }
        }
        check
    }
}
