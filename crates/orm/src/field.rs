//! Field metadata - declarative descriptors for model attributes.
//!
//! A model type declares its attributes as a list of [`FieldDef`]s; the
//! common fields (primary key, timestamps, delete flag) are merged in by
//! the model layer and the result is cached once per type as a
//! [`FieldSet`]. Descriptors are immutable after construction and no
//! consistency checking happens here; callers supply matching types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Logical (in-memory) data type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Enum,
    DateTime,
    Object,
    /// The field holds a reference to another model, not a column value.
    ModelRef,
}

/// Storage (column) data type of a field, MariaDB flavored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    Null,
    Bool,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Numeric,
    VarChar,
    Date,
    Timestamp,
}

/// Immutable descriptor of one model attribute.
///
/// `min`/`max` bounds follow the logical type: length bounds for strings,
/// value bounds for integers.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub column: &'static str,
    pub label: &'static str,
    pub logical: LogicalType,
    pub storage: StorageType,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub default: Option<Value>,
    pub ref_model: Option<&'static str>,
    pub ref_key: Option<&'static str>,
}

impl FieldDef {
    /// Create a plain column-backed field.
    pub fn new(
        name: &'static str,
        column: &'static str,
        label: &'static str,
        logical: LogicalType,
        storage: StorageType,
    ) -> Self {
        Self {
            name,
            column,
            label,
            logical,
            storage,
            min: None,
            max: None,
            default: None,
            ref_model: None,
            ref_key: None,
        }
    }

    /// Create a model-reference field. It is not backed by a column; the
    /// foreign key lives in the field named by `ref_key`.
    pub fn reference(
        name: &'static str,
        label: &'static str,
        ref_model: &'static str,
        ref_key: &'static str,
    ) -> Self {
        Self {
            name,
            column: "",
            label,
            logical: LogicalType::ModelRef,
            storage: StorageType::Null,
            min: None,
            max: None,
            default: None,
            ref_model: Some(ref_model),
            ref_key: Some(ref_key),
        }
    }

    /// Attach min/max bounds.
    pub fn bounds(mut self, min: impl Into<Option<i64>>, max: impl Into<Option<i64>>) -> Self {
        self.min = min.into();
        self.max = max.into();
        self
    }

    /// Attach a default value.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn is_reference(&self) -> bool {
        self.logical == LogicalType::ModelRef
    }
}

/// The complete, ordered field list of a model type with a name index.
///
/// Constructed once per model type (common fields first, then the
/// model-specific ones) and cached behind a `Lazy`.
#[derive(Debug)]
pub struct FieldSet {
    fields: Vec<FieldDef>,
    index: HashMap<&'static str, usize>,
    own_start: usize,
}

impl FieldSet {
    /// Build a field set from the common fields and the model's own ones.
    pub fn new(common: Vec<FieldDef>, own: Vec<FieldDef>) -> Self {
        let own_start = common.len();
        let mut fields = common;
        fields.extend(own);
        let index = fields
            .iter()
            .enumerate()
            .map(|(pos, field)| (field.name, pos))
            .collect();
        Self {
            fields,
            index,
            own_start,
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.index.get(name).map(|pos| &self.fields[*pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    /// Fields that reference other models.
    pub fn references(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|field| field.is_reference())
    }

    /// All field names, declaration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.name).collect()
    }

    /// The primary key plus the model-specific field names. The remaining
    /// common fields are managed by the logic layer, not by callers.
    pub fn own_names(&self) -> Vec<&'static str> {
        let mut names = vec![self.fields[0].name];
        names.extend(self.fields[self.own_start..].iter().map(|field| field.name));
        names
    }

    pub fn column(&self, name: &str) -> Option<&'static str> {
        self.get(name).map(|field| field.column)
    }

    pub fn label(&self, name: &str) -> Option<&'static str> {
        self.get(name).map(|field| field.label)
    }

    pub fn logical_type(&self, name: &str) -> Option<LogicalType> {
        self.get(name).map(|field| field.logical)
    }

    pub fn storage_type(&self, name: &str) -> Option<StorageType> {
        self.get(name).map(|field| field.storage)
    }

    pub fn min(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|field| field.min)
    }

    pub fn max(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|field| field.max)
    }

    pub fn default(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(|field| field.default.as_ref())
    }

    /// Logical types per field, for validation.
    pub fn logical_types(&self) -> HashMap<&'static str, LogicalType> {
        self.fields
            .iter()
            .map(|field| (field.name, field.logical))
            .collect()
    }

    /// Storage types per field, for persistence.
    pub fn storage_types(&self) -> HashMap<&'static str, StorageType> {
        self.fields
            .iter()
            .map(|field| (field.name, field.storage))
            .collect()
    }
}
