//! Query definitions and their rendering into backend predicates.
//!
//! A [`Query`] is a table name, a field set and an ordered condition
//! list. Rendering substitutes each field's storage column and either
//! literal values or named placeholders into an operator template table
//! supplied by the backend, so the query itself carries no SQL dialect.

use serde_json::Value;

use crate::error::{OrmError, OrmResult};
use crate::field::FieldSet;

/// Condition operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// No operation; skipped during rendering.
    Nop,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    In,
    NotIn,
    Between,
    /// Starts with.
    Starts,
    /// Ends with.
    Ends,
    Contains,
    Null,
    NotNull,
    /// Explicit conjunction between the surrounding conditions.
    And,
    /// Explicit disjunction between the surrounding conditions.
    Or,
}

impl Op {
    /// Number of comparison values the operator consumes.
    pub fn param_count(self) -> usize {
        match self {
            Op::Nop | Op::Null | Op::NotNull | Op::And | Op::Or => 0,
            Op::Between => 2,
            _ => 1,
        }
    }

    /// Whether the operator joins its neighbours instead of comparing.
    pub fn is_joiner(self) -> bool {
        matches!(self, Op::And | Op::Or)
    }
}

/// Operator template lookup supplied by a backend. Templates use
/// positional substitution points: `{0}` is the storage column, later
/// slots are comparison values.
pub type OpTable = fn(Op) -> &'static str;

/// One condition of a query definition: a field, an operator and
/// optional literal values. Without literals, rendering emits named
/// placeholders to be bound at execution time.
#[derive(Debug, Clone)]
pub struct Cond {
    pub field: &'static str,
    pub op: Op,
    pub values: Vec<Value>,
}

impl Cond {
    pub fn new(field: &'static str, op: Op) -> Self {
        Self {
            field,
            op,
            values: Vec::new(),
        }
    }

    pub fn with(field: &'static str, op: Op, values: Vec<Value>) -> Self {
        Self { field, op, values }
    }

    /// An explicit AND/OR entry between two conditions.
    pub fn joiner(op: Op) -> Self {
        Self {
            field: "",
            op,
            values: Vec::new(),
        }
    }
}

/// A renderable query definition against one table.
#[derive(Debug, Clone)]
pub struct Query {
    table: &'static str,
    fields: &'static FieldSet,
    conds: Vec<Cond>,
}

impl Query {
    pub fn new(table: &'static str, fields: &'static FieldSet, conds: Vec<Cond>) -> Self {
        Self {
            table,
            fields,
            conds,
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn fields(&self) -> &'static FieldSet {
        self.fields
    }

    pub fn conditions(&self) -> &[Cond] {
        &self.conds
    }

    /// Render the condition list into a predicate string using the
    /// backend's operator table. Conditions join with AND unless an
    /// explicit [`Op::And`]/[`Op::Or`] entry intervenes.
    ///
    /// Fails when a field is unknown to the field set or when literal
    /// values are supplied but do not match the operator's arity.
    pub fn render(&self, ops: OpTable) -> OrmResult<String> {
        let mut predicate = String::new();
        let mut pending_joiner: Option<&'static str> = None;

        for cond in &self.conds {
            if cond.op == Op::Nop {
                continue;
            }
            if cond.op.is_joiner() {
                if !predicate.is_empty() {
                    pending_joiner = Some(ops(cond.op));
                }
                continue;
            }

            let field = self.fields.get(cond.field).ok_or_else(|| {
                OrmError::Query(format!("unknown field '{}' in condition", cond.field))
            })?;
            let arity = cond.op.param_count();
            if !cond.values.is_empty() && cond.values.len() != arity {
                return Err(OrmError::Query(format!(
                    "operator {:?} takes {} value(s), got {}",
                    cond.op,
                    arity,
                    cond.values.len()
                )));
            }

            if !predicate.is_empty() {
                predicate.push_str(pending_joiner.take().unwrap_or(ops(Op::And)));
            }
            let mut rendered = ops(cond.op).replace("{0}", field.column);
            for slot in 1..=arity {
                let substitution = if cond.values.is_empty() {
                    placeholder(cond.field, slot)
                } else {
                    literal(&cond.values[slot - 1])
                };
                rendered = rendered.replace(&format!("{{{slot}}}"), &substitution);
            }
            predicate.push_str(&rendered);
        }

        Ok(predicate)
    }
}

/// Named placeholder for parameter slot `slot` of `field`: `:field`,
/// then `:field2`, `:field3`, ...
pub fn placeholder(field: &str, slot: usize) -> String {
    if slot == 1 {
        format!(":{field}")
    } else {
        format!(":{field}{slot}")
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => if *flag { "1" } else { "0" }.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(literal)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_per_operator() {
        assert_eq!(Op::Nop.param_count(), 0);
        assert_eq!(Op::Null.param_count(), 0);
        assert_eq!(Op::NotNull.param_count(), 0);
        assert_eq!(Op::And.param_count(), 0);
        assert_eq!(Op::Or.param_count(), 0);
        assert_eq!(Op::Between.param_count(), 2);
        assert_eq!(Op::Eq.param_count(), 1);
        assert_eq!(Op::In.param_count(), 1);
        assert_eq!(Op::Contains.param_count(), 1);
    }

    #[test]
    fn placeholder_numbering() {
        assert_eq!(placeholder("age", 1), ":age");
        assert_eq!(placeholder("age", 2), ":age2");
    }
}
