//! Storage backend abstraction.
//!
//! The logic layer talks to storage exclusively through [`Backend`].
//! Rows travel as field-name-keyed value maps; the field set carries the
//! field-to-column mapping and storage types a concrete backend needs.
//! Each backend also supplies the operator template table used to render
//! [`Query`] definitions, so swapping backends swaps the rendering table
//! and nothing else.

pub mod mariadb;
pub mod memory;

use std::collections::HashMap;
use std::fmt::Debug;

use serde_json::Value;

use crate::error::OrmResult;
use crate::field::FieldSet;
use crate::query::{Op, Query};

/// A stored row, keyed by field name.
pub type Row = HashMap<String, Value>;

/// Named query parameters, keyed by placeholder (`:name`).
pub type Params = HashMap<String, Value>;

/// Synchronous storage operations required by the logic layer.
///
/// Calls block until the backend answers; `lock` requests a row lock
/// held for the duration of the caller's transaction. Transaction
/// boundaries themselves are owned by the caller, not this trait.
pub trait Backend: Debug {
    /// Current maximum value of `key_column` in `table`, 0 when empty.
    fn get_max(&self, table: &str, key_column: &str) -> OrmResult<i64>;

    /// Fetch a single row by primary key. `Ok(None)` when absent.
    fn get(&self, table: &str, pkey: i64, fields: &FieldSet, lock: bool)
        -> OrmResult<Option<Row>>;

    /// Batch-insert rows. Returns the inserted count.
    fn create(&self, table: &str, rows: &[Row], fields: &FieldSet, return_keys: bool)
        -> OrmResult<u64>;

    /// Batch-update rows by primary key. Returns the updated count.
    fn update(&self, table: &str, rows: &[Row], fields: &FieldSet, by_key: bool)
        -> OrmResult<u64>;

    /// Execute a query definition and return the matching rows.
    fn select(&self, query: &Query, params: &Params, lock: bool) -> OrmResult<Vec<Row>>;

    /// The operator rendering table of this backend's dialect.
    fn op_template(&self, op: Op) -> &'static str;
}
