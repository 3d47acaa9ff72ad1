//! The field-check pipeline.
//!
//! A [`FieldCheck`] binds one field of a subject (a live model or a raw
//! row) to the shared [`Results`] accumulator, loads the value, label
//! and bounds from the field descriptor, and exposes the chainable
//! normalize/constrain steps that per-kind validators compose. Steps
//! record diagnostics instead of short-circuiting; [`FieldCheck::end`]
//! writes the (possibly normalized) value back to the subject.

use serde_json::Value;

use kiroku_orm::{FieldSet, Model, Row};

use crate::results::Results;
use crate::width;

/// What a validation pass runs against: a live model or a raw row with
/// the field set describing it. The two are mutually exclusive sources.
pub enum Subject<'a> {
    Model(&'a dyn Model),
    Row {
        row: &'a mut Row,
        fields: &'static FieldSet,
    },
}

impl<'a> Subject<'a> {
    pub fn model(model: &'a dyn Model) -> Self {
        Subject::Model(model)
    }

    pub fn row(row: &'a mut Row, fields: &'static FieldSet) -> Self {
        Subject::Row { row, fields }
    }

    pub fn fields(&self) -> &'static FieldSet {
        match self {
            Subject::Model(model) => model.fields(),
            Subject::Row { fields, .. } => fields,
        }
    }

    fn get(&self, name: &str) -> Value {
        match self {
            Subject::Model(model) => model.get_value(name).unwrap_or(Value::Null),
            Subject::Row { row, .. } => row.get(name).cloned().unwrap_or(Value::Null),
        }
    }

    fn set(&mut self, name: &str, value: Value) {
        match self {
            Subject::Model(model) => {
                if let Err(error) = model.set_value(name, &value, true) {
                    tracing::warn!(field = name, %error, "validated value write-back failed");
                }
            }
            Subject::Row { row, .. } => {
                row.insert(name.to_string(), value);
            }
        }
    }
}

/// One field bound for checking. Created per call; holds no state
/// beyond the pass it belongs to.
pub struct FieldCheck<'m, 'a> {
    subject: &'m mut Subject<'a>,
    results: &'m mut Results,
    name: String,
    label: &'static str,
    min: Option<i64>,
    max: Option<i64>,
    value: Value,
    skip: bool,
}

impl<'m, 'a> FieldCheck<'m, 'a> {
    /// Bind `field` of `subject`. An unknown field records an error and
    /// degrades every later step (and the write-back) to a no-op.
    pub fn start(
        subject: &'m mut Subject<'a>,
        field: &str,
        results: &'m mut Results,
    ) -> FieldCheck<'m, 'a> {
        match subject.fields().get(field) {
            Some(def) => {
                let value = subject.get(field);
                FieldCheck {
                    name: field.to_string(),
                    label: def.label,
                    min: def.min,
                    max: def.max,
                    value,
                    skip: false,
                    subject,
                    results,
                }
            }
            None => {
                results.error(field, format!("field '{field}' is not defined"), Value::Null);
                FieldCheck {
                    name: field.to_string(),
                    label: "",
                    min: None,
                    max: None,
                    value: Value::Null,
                    skip: true,
                    subject,
                    results,
                }
            }
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_skip(&self) -> bool {
        self.skip
    }

    pub(crate) fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        let value = self.value.clone();
        self.results.error(self.name.clone(), message, value);
    }

    pub fn record_warning(&mut self, message: impl Into<String>) {
        let value = self.value.clone();
        self.results.warning(self.name.clone(), message, value);
    }

    /// Whether this field has produced an error so far in the pass.
    pub fn field_failed(&self) -> bool {
        self.results.has_errors_for(&self.name)
    }

    /// Reject null or empty values when the field is mandatory.
    pub fn mandatory(mut self, mandatory: bool) -> Self {
        if self.skip || !mandatory {
            return self;
        }
        let empty = self.value.is_null()
            || self.value.as_str().is_some_and(|text| text.is_empty());
        if empty {
            self.record_error(format!("{} must not be empty", self.label));
        }
        self
    }

    /// Normalize to half-width, warn when anything changed, and require
    /// the result to be plain ASCII.
    pub fn half_width(mut self) -> Self {
        if self.skip || self.value.is_null() {
            return self;
        }
        if let Some(converted) = self.value.as_str().map(width::to_half_width) {
            if self.value.as_str() != Some(converted.as_str()) {
                self.value = Value::String(converted);
                self.record_warning(format!(
                    "{} was converted to half-width characters",
                    self.label
                ));
            }
        }
        let non_ascii = self.value.as_str().is_some_and(|text| !text.is_ascii());
        if non_ascii {
            self.record_error(format!(
                "{} must consist of half-width alphanumeric characters",
                self.label
            ));
        }
        self
    }

    /// Normalize to full-width, warn when anything changed, and require
    /// the result to be free of half-width characters.
    pub fn full_width(mut self) -> Self {
        if self.skip || self.value.is_null() {
            return self;
        }
        if let Some(converted) = self.value.as_str().map(width::to_full_width) {
            if self.value.as_str() != Some(converted.as_str()) {
                self.value = Value::String(converted);
                self.record_warning(format!(
                    "{} was converted to full-width characters",
                    self.label
                ));
            }
        }
        let half_width_left = self.value.as_str().is_some_and(|text| {
            width::contains_any(text, width::HAN_ALPH)
                + width::contains_any(text, width::HAN_NUM)
                + width::contains_any(text, width::HAN_SYM)
                > 0
        });
        if half_width_left {
            self.record_error(format!(
                "{} must consist of full-width characters",
                self.label
            ));
        }
        self
    }

    /// Constrain string values to the descriptor's length bounds.
    /// Numbers pass through untouched; other non-strings are rejected.
    pub fn string_shape(mut self) -> Self {
        if self.skip || self.value.is_null() {
            return self;
        }
        match &self.value {
            Value::String(text) => {
                let length = text.chars().count() as i64;
                if self.min.is_some_and(|min| length < min) {
                    let min = self.min.unwrap_or(0);
                    self.record_error(format!(
                        "{} must be at least {min} characters long",
                        self.label
                    ));
                } else if self.max.is_some_and(|max| length > max) {
                    let max = self.max.unwrap_or(0);
                    self.record_error(format!(
                        "{} must be at most {max} characters long",
                        self.label
                    ));
                }
            }
            Value::Number(_) => {}
            _ => {
                self.record_error(format!("{} must be a string", self.label));
            }
        }
        self
    }

    /// Parse the value as an integer, constrain it to the descriptor's
    /// value bounds and (when given) the allowed set, and normalize the
    /// working value to a number.
    pub fn integer(mut self, allowed: &[i64]) -> Self {
        if self.skip || self.value.is_null() {
            return self;
        }
        let parsed = match &self.value {
            Value::Number(number) => number.as_i64(),
            Value::String(text) if width::is_integer_str(text) => text.parse().ok(),
            _ => None,
        };
        let Some(number) = parsed else {
            self.record_error(format!("{} must be a number", self.label));
            return self;
        };
        self.value = Value::from(number);
        if self.min.is_some_and(|min| number < min) {
            let min = self.min.unwrap_or(0);
            self.record_error(format!("{} must be at least {min}", self.label));
        } else if self.max.is_some_and(|max| number > max) {
            let max = self.max.unwrap_or(0);
            self.record_error(format!("{} must be at most {max}", self.label));
        }
        if !allowed.is_empty() && !allowed.contains(&number) {
            let list = allowed
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            self.record_error(format!("{} must be one of [{list}]", self.label));
        }
        self
    }

    /// Write the working value back to the subject and report whether
    /// the whole accumulator is still free of errors.
    pub fn end(self) -> bool {
        if !self.skip {
            self.subject.set(&self.name, self.value);
        }
        self.results.is_ok()
    }
}
