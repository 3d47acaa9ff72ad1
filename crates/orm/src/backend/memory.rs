//! In-memory storage backend.
//!
//! Keeps tables as ordered maps of primary key to row and evaluates
//! query conditions structurally instead of rendering SQL. Serves as the
//! storage stub for tests and examples; `fail_next` injects a backend
//! failure into the next call of a named operation to exercise failure
//! paths.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use super::mariadb::op_template;
use super::{Backend, Params, Row};
use crate::error::{DbError, OrmResult};
use crate::field::FieldSet;
use crate::model::PKEY;
use crate::query::{Cond, Op, Query};

#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RefCell<HashMap<String, BTreeMap<i64, Row>>>,
    fail_next: RefCell<Option<(String, DbError)>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of operation `op` (`"get_max"`, `"get"`,
    /// `"create"`, `"update"`, `"select"`) fail with `error`.
    pub fn fail_next(&self, op: &str, error: DbError) {
        *self.fail_next.borrow_mut() = Some((op.to_string(), error));
    }

    /// Seed a row directly, bypassing the logic layer.
    pub fn insert_row(&self, table: &str, pkey: i64, row: Row) {
        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .insert(pkey, row);
    }

    /// Snapshot of a stored row.
    pub fn row(&self, table: &str, pkey: i64) -> Option<Row> {
        self.tables
            .borrow()
            .get(table)
            .and_then(|rows| rows.get(&pkey))
            .cloned()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .borrow()
            .get(table)
            .map_or(0, |rows| rows.len())
    }

    fn check_failure(&self, op: &str) -> Result<(), DbError> {
        let mut pending = self.fail_next.borrow_mut();
        match pending.take() {
            Some((target, error)) if target == op => Err(error),
            other => {
                *pending = other;
                Ok(())
            }
        }
    }

    fn row_pkey(row: &Row) -> Result<i64, DbError> {
        row.get(PKEY)
            .and_then(Value::as_i64)
            .ok_or_else(|| DbError::Bind("row is missing a primary key".to_string()))
    }
}

impl Backend for MemoryBackend {
    fn get_max(&self, table: &str, _key_column: &str) -> OrmResult<i64> {
        self.check_failure("get_max")?;
        let max = self
            .tables
            .borrow()
            .get(table)
            .and_then(|rows| rows.keys().next_back().copied())
            .unwrap_or(0);
        Ok(max)
    }

    fn get(
        &self,
        table: &str,
        pkey: i64,
        _fields: &FieldSet,
        _lock: bool,
    ) -> OrmResult<Option<Row>> {
        self.check_failure("get")?;
        Ok(self.row(table, pkey))
    }

    fn create(
        &self,
        table: &str,
        rows: &[Row],
        _fields: &FieldSet,
        _return_keys: bool,
    ) -> OrmResult<u64> {
        self.check_failure("create")?;
        let mut tables = self.tables.borrow_mut();
        let stored = tables.entry(table.to_string()).or_default();
        for row in rows {
            let pkey = Self::row_pkey(row)?;
            if stored.contains_key(&pkey) {
                return Err(DbError::Execute(format!(
                    "duplicate primary key {pkey} in table '{table}'"
                ))
                .into());
            }
            stored.insert(pkey, row.clone());
        }
        Ok(rows.len() as u64)
    }

    fn update(
        &self,
        table: &str,
        rows: &[Row],
        _fields: &FieldSet,
        _by_key: bool,
    ) -> OrmResult<u64> {
        self.check_failure("update")?;
        let mut tables = self.tables.borrow_mut();
        let stored = tables.entry(table.to_string()).or_default();
        let mut updated = 0;
        for row in rows {
            let pkey = Self::row_pkey(row)?;
            if let Some(existing) = stored.get_mut(&pkey) {
                existing.extend(row.clone());
                updated += 1;
            }
        }
        Ok(updated)
    }

    fn select(&self, query: &Query, params: &Params, _lock: bool) -> OrmResult<Vec<Row>> {
        self.check_failure("select")?;
        let tables = self.tables.borrow();
        let Some(rows) = tables.get(query.table()) else {
            return Ok(Vec::new());
        };
        let mut matched = Vec::new();
        for row in rows.values() {
            if eval_conditions(query.conditions(), params, row)? {
                matched.push(row.clone());
            }
        }
        Ok(matched)
    }

    fn op_template(&self, op: Op) -> &'static str {
        op_template(op)
    }
}

/// Evaluate a condition list against one row, joining with AND unless an
/// explicit AND/OR entry intervenes.
fn eval_conditions(conds: &[Cond], params: &Params, row: &Row) -> OrmResult<bool> {
    let mut result: Option<bool> = None;
    let mut joiner = Op::And;
    for cond in conds {
        if cond.op == Op::Nop {
            continue;
        }
        if cond.op.is_joiner() {
            joiner = cond.op;
            continue;
        }
        let matched = eval_cond(cond, params, row)?;
        result = Some(match (result, joiner) {
            (None, _) => matched,
            (Some(acc), Op::Or) => acc || matched,
            (Some(acc), _) => acc && matched,
        });
        joiner = Op::And;
    }
    Ok(result.unwrap_or(true))
}

fn eval_cond(cond: &Cond, params: &Params, row: &Row) -> OrmResult<bool> {
    let actual = row.get(cond.field).cloned().unwrap_or(Value::Null);
    match cond.op {
        Op::Null => return Ok(actual.is_null()),
        Op::NotNull => return Ok(!actual.is_null()),
        _ => {}
    }

    let expected = resolve_values(cond, params)?;
    let matched = match cond.op {
        Op::Eq => values_equal(&actual, &expected[0]),
        Op::Ne => !values_equal(&actual, &expected[0]),
        Op::Lt => compare(&actual, &expected[0]) == Some(std::cmp::Ordering::Less),
        Op::Gt => compare(&actual, &expected[0]) == Some(std::cmp::Ordering::Greater),
        Op::Le => matches!(
            compare(&actual, &expected[0]),
            Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
        ),
        Op::Ge => matches!(
            compare(&actual, &expected[0]),
            Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
        ),
        Op::In => in_list(&actual, &expected[0]),
        Op::NotIn => !in_list(&actual, &expected[0]),
        Op::Between => {
            matches!(
                compare(&actual, &expected[0]),
                Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
            ) && matches!(
                compare(&actual, &expected[1]),
                Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
            )
        }
        Op::Starts => text_pair(&actual, &expected[0])
            .map_or(false, |(value, probe)| value.starts_with(&probe)),
        Op::Ends => text_pair(&actual, &expected[0])
            .map_or(false, |(value, probe)| value.ends_with(&probe)),
        Op::Contains => text_pair(&actual, &expected[0])
            .map_or(false, |(value, probe)| value.contains(&probe)),
        Op::Nop | Op::Null | Op::NotNull | Op::And | Op::Or => true,
    };
    Ok(matched)
}

/// Comparison values for a condition: literals when supplied, otherwise
/// the bound parameters for the condition's placeholders.
fn resolve_values(cond: &Cond, params: &Params) -> OrmResult<Vec<Value>> {
    let arity = cond.op.param_count();
    if !cond.values.is_empty() {
        if cond.values.len() != arity {
            return Err(DbError::Bind(format!(
                "operator {:?} takes {} value(s), got {}",
                cond.op,
                arity,
                cond.values.len()
            ))
            .into());
        }
        return Ok(cond.values.clone());
    }
    let mut values = Vec::with_capacity(arity);
    for slot in 1..=arity {
        let key = crate::query::placeholder(cond.field, slot);
        let value = params.get(&key).cloned().ok_or_else(|| {
            DbError::Bind(format!("missing parameter '{key}'"))
        })?;
        values.push(value);
    }
    Ok(values)
}

fn values_equal(left: &Value, right: &Value) -> bool {
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return a == b;
    }
    left == right
}

fn compare(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return a.partial_cmp(&b);
    }
    match (left.as_str(), right.as_str()) {
        (Some(a), Some(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn in_list(actual: &Value, list: &Value) -> bool {
    match list {
        Value::Array(items) => items.iter().any(|item| values_equal(actual, item)),
        other => values_equal(actual, other),
    }
}

fn text_pair(actual: &Value, probe: &Value) -> Option<(String, String)> {
    Some((actual.as_str()?.to_string(), probe.as_str()?.to_string()))
}
