//! Integer fields: half-width digits and an optional minus sign.

use crate::field::FieldCheck;

#[derive(Debug, Clone, Default)]
pub struct IntValidator {
    allowed: Vec<i64>,
}

impl IntValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the value to an enumerated set.
    pub fn allowed(mut self, values: &[i64]) -> Self {
        self.allowed = values.to_vec();
        self
    }

    /// mandatory → half-width → string shape → integer parse/range.
    pub fn check<'m, 'a>(&self, check: FieldCheck<'m, 'a>, mandatory: bool) -> FieldCheck<'m, 'a> {
        check
            .mandatory(mandatory)
            .half_width()
            .string_shape()
            .integer(&self.allowed)
    }
}
