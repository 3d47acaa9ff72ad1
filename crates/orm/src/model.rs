//! Model layer: lazily-loaded, write-buffered record handles.
//!
//! A concrete model is a cheaply clonable handle (`Rc<RefCell<..>>`)
//! around its data; clones alias one entity, which is what the identity
//! map in [`Logic`](crate::logic::Logic) stores and hands out. The
//! object-safe [`Model`] trait carries the capability set the generic
//! logic and validation layers work against; [`ModelType`] adds the
//! static metadata and the constructor.
//!
//! Lifecycle: a handle constructed with pkey 0 mints a negative
//! pseudo-key from a process-wide strictly-decreasing counter and stays
//! non-activated until it is either loaded from storage or mutated
//! through a setter. Every typed accessor funnels through the activation
//! gate [`act_base`]: setters register the model as dirty with its
//! logic, getters trigger a one-time lazy load.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::backend::Row;
use crate::error::{OrmError, OrmResult};
use crate::field::{FieldDef, FieldSet, LogicalType, StorageType};
use crate::registry::Registry;

/// Primary key field name.
pub const PKEY: &str = "pkey";
/// Creation timestamp field name.
pub const CREATE_DATE: &str = "createDate";
/// Last-update timestamp field name.
pub const UPDATE_DATE: &str = "updateDate";
/// Soft-delete marker field name.
pub const DELETE_FLAG: &str = "deleteFlag";

static PSEUDO_PKEY: AtomicI64 = AtomicI64::new(-1);

/// Mint the next pseudo primary key. Strictly decreasing and unique
/// within the process; replaced by a real key at save time.
pub fn next_pseudo_pkey() -> i64 {
    PSEUDO_PKEY.fetch_sub(1, Ordering::Relaxed)
}

/// The field descriptors shared by every model.
pub fn common_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new(PKEY, "pkey", "主キー", LogicalType::Int, StorageType::Int),
        FieldDef::new(
            CREATE_DATE,
            "create_date",
            "作成日",
            LogicalType::DateTime,
            StorageType::Timestamp,
        ),
        FieldDef::new(
            UPDATE_DATE,
            "update_date",
            "更新日",
            LogicalType::DateTime,
            StorageType::Timestamp,
        ),
        FieldDef::new(
            DELETE_FLAG,
            "delete_flag",
            "削除フラグ",
            LogicalType::Bool,
            StorageType::Bool,
        ),
    ]
}

/// Build a model type's full field set: common fields plus its own.
pub fn model_field_set(own: Vec<FieldDef>) -> FieldSet {
    FieldSet::new(common_fields(), own)
}

/// Datetimes travel as RFC 3339 strings inside generic value maps.
pub fn datetime_to_value(datetime: Option<DateTime<Utc>>) -> Value {
    match datetime {
        Some(datetime) => Value::String(datetime.to_rfc3339_opts(SecondsFormat::Micros, true)),
        None => Value::Null,
    }
}

pub fn value_to_datetime(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// The per-model state every concrete model embeds: primary key,
/// activation flag, common fields and the back-reference to the owning
/// registry.
#[derive(Debug)]
pub struct ModelCore {
    pkey: i64,
    activated: bool,
    create_date: Option<DateTime<Utc>>,
    update_date: Option<DateTime<Utc>>,
    delete_flag: Option<bool>,
    registry: Weak<Registry>,
}

impl ModelCore {
    /// A pkey of 0 mints a fresh pseudo-key; anything else is taken as
    /// given. Handles start out non-activated.
    pub fn new(pkey: i64, registry: Weak<Registry>) -> Self {
        let pkey = if pkey == 0 { next_pseudo_pkey() } else { pkey };
        Self {
            pkey,
            activated: false,
            create_date: None,
            update_date: None,
            delete_flag: None,
            registry,
        }
    }

    pub fn pkey(&self) -> i64 {
        self.pkey
    }

    pub fn set_pkey(&mut self, pkey: i64) {
        self.pkey = pkey;
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn set_activated(&mut self, activated: bool) {
        self.activated = activated;
    }

    pub fn registry(&self) -> Option<Rc<Registry>> {
        self.registry.upgrade()
    }

    pub fn create_date(&self) -> Option<DateTime<Utc>> {
        self.create_date
    }

    pub fn update_date(&self) -> Option<DateTime<Utc>> {
        self.update_date
    }

    pub fn delete_flag(&self) -> Option<bool> {
        self.delete_flag
    }

    /// Generic read of a common field; `Value::Null` for unset ones.
    pub fn value(&self, field: &str) -> Value {
        match field {
            PKEY => Value::from(self.pkey),
            CREATE_DATE => datetime_to_value(self.create_date),
            UPDATE_DATE => datetime_to_value(self.update_date),
            DELETE_FLAG => self.delete_flag.map(Value::from).unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Generic write of a common field. Returns false when the name is
    /// not a common field.
    pub fn set_value(&mut self, field: &str, value: &Value) -> bool {
        match field {
            PKEY => {
                if let Some(pkey) = value.as_i64() {
                    self.pkey = pkey;
                }
                true
            }
            CREATE_DATE => {
                self.create_date = value_to_datetime(value);
                true
            }
            UPDATE_DATE => {
                self.update_date = value_to_datetime(value);
                true
            }
            DELETE_FLAG => {
                self.delete_flag = match value {
                    Value::Bool(flag) => Some(*flag),
                    Value::Number(number) => number.as_i64().map(|raw| raw != 0),
                    _ => None,
                };
                true
            }
            _ => false,
        }
    }
}

/// A model-reference field of a model: which model it points at and
/// which sibling field holds the foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentModel {
    pub field: &'static str,
    pub model_name: &'static str,
    pub key_field: &'static str,
}

/// Object-safe capability set of a record, shared by the generic logic
/// and validation layers.
///
/// `get_value`/`set_value` dispatch by field name through a `match` in
/// each implementation; an unknown name is `OrmError::FieldNotFound`.
/// Reading a model-reference field through `get_value` yields
/// `Value::Null` — references are navigated with `get_ref`.
pub trait Model: Debug {
    fn model_name(&self) -> &'static str;

    /// The cached field set of this model's type.
    fn fields(&self) -> &'static FieldSet;

    /// The primary key. Reading it never triggers activation.
    fn pkey(&self) -> i64;

    fn set_pkey(&self, pkey: i64);

    fn is_activated(&self) -> bool;

    fn set_activated(&self, activated: bool);

    /// The owning registry, if the handle is attached to one.
    fn registry(&self) -> Option<Rc<Registry>>;

    fn get_value(&self, field: &str) -> OrmResult<Value>;

    /// Set a field from a generic value. With `dirty`, the model is also
    /// registered with its logic as pending update.
    fn set_value(&self, field: &str, value: &Value, dirty: bool) -> OrmResult<()>;

    /// The resolved reference held in a model-reference field.
    fn get_ref(&self, field: &str) -> Option<Box<dyn Model>>;

    /// Attach a resolved reference to a model-reference field without
    /// marking the owner dirty. The foreign-key sibling field is kept in
    /// sync by the implementation.
    fn set_ref(&self, field: &str, target: &dyn Model) -> OrmResult<()>;

    fn as_any(&self) -> &dyn Any;

    fn field_not_found(&self, field: &str) -> OrmError {
        OrmError::FieldNotFound {
            model: self.model_name().to_string(),
            field: field.to_string(),
        }
    }

    /// Serialize value-backed fields into a row. Model-reference fields
    /// are never emitted, and neither is a still-negative primary key.
    fn to_map(&self, only: Option<&[&str]>) -> OrmResult<Row> {
        let names: Vec<&str> = match only {
            Some(names) => names.to_vec(),
            None => self.fields().names(),
        };
        let mut row = Row::new();
        for name in names {
            let field = self
                .fields()
                .get(name)
                .ok_or_else(|| self.field_not_found(name))?;
            if field.is_reference() {
                continue;
            }
            let value = self.get_value(name)?;
            if name == PKEY && value.as_i64().is_some_and(|pkey| pkey < 0) {
                continue;
            }
            row.insert(name.to_string(), value);
        }
        Ok(row)
    }

    /// Populate own fields (primary key + model-specific) from a row.
    /// Without `overwrite`, fields already holding a value are kept.
    /// The model counts as activated from here on; the flag is raised
    /// up front so reading current values cannot re-enter the lazy load.
    fn from_map(&self, values: &Row, overwrite: bool, dirty: bool) -> OrmResult<()> {
        self.set_activated(true);
        for name in self.fields().own_names() {
            let field = self
                .fields()
                .get(name)
                .ok_or_else(|| self.field_not_found(name))?;
            if field.is_reference() {
                continue;
            }
            if !overwrite && !self.get_value(name)?.is_null() {
                continue;
            }
            let value = values.get(name).cloned().unwrap_or(Value::Null);
            self.set_value(name, &value, dirty)?;
        }
        Ok(())
    }

    /// Logical types per field, for validation.
    fn logical_types(&self) -> HashMap<&'static str, LogicalType> {
        self.fields().logical_types()
    }

    /// Storage types per field, for persistence.
    fn storage_types(&self) -> HashMap<&'static str, StorageType> {
        self.fields().storage_types()
    }

    /// The models this one depends on: they must be persisted first so
    /// the foreign keys they produce are valid.
    fn dependent_models(&self) -> Vec<DependentModel> {
        self.fields()
            .references()
            .map(|field| DependentModel {
                field: field.name,
                model_name: field.ref_model.unwrap_or(""),
                key_field: field.ref_key.unwrap_or(""),
            })
            .collect()
    }

    /// Abandon an in-flight edit: drop the activation flag and remove
    /// the model from its logic's pending-update buffer.
    fn deactivate(&self) {
        self.set_activated(false);
        if let Some(registry) = self.registry() {
            if let Some(logic) = registry.logic_by_name(self.model_name()) {
                logic.remove_update(self.pkey());
            }
        }
    }
}

/// Static side of a model type: identity, table, cached field set and
/// the constructor the generic logic uses.
pub trait ModelType: Model + Clone + Sized + 'static {
    const MODEL_NAME: &'static str;
    const TABLE: &'static str;

    fn field_set() -> &'static FieldSet;

    /// Construct a handle. A pkey of 0 mints a pseudo-key (see
    /// [`ModelCore::new`]); the handle is not registered with any logic.
    fn construct(pkey: i64, registry: Weak<Registry>) -> Self;
}

/// The activation gate every typed accessor funnels through.
///
/// Setter calls register the model with its logic as dirty. Getter calls
/// on a non-activated model mark it activated and load it from storage
/// once; a handle detached from any registry degrades to a no-op gate.
pub fn act_base<M: ModelType>(model: &M, is_setter: bool) {
    if is_setter {
        model.set_activated(true);
        if let Some(registry) = model.registry() {
            if let Some(logic) = registry.logic::<M>() {
                logic.register(model.clone(), true);
            }
        }
    } else if !model.is_activated() {
        let Some(registry) = model.registry() else {
            return;
        };
        let Some(logic) = registry.logic::<M>() else {
            return;
        };
        model.set_activated(true);
        match logic.load(model, false) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(
                    model = M::MODEL_NAME,
                    pkey = model.pkey(),
                    "lazy load found no row"
                );
            }
            Err(error) => {
                tracing::warn!(
                    model = M::MODEL_NAME,
                    pkey = model.pkey(),
                    %error,
                    "lazy load failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pseudo_keys_strictly_decrease() {
        let first = next_pseudo_pkey();
        let second = next_pseudo_pkey();
        let third = next_pseudo_pkey();
        assert!(first < 0);
        assert!(second < first);
        assert!(third < second);
    }

    #[test]
    fn core_with_zero_pkey_mints_pseudo_key() {
        let core = ModelCore::new(0, Weak::new());
        assert!(core.pkey() < 0);
        assert!(!core.is_activated());

        let existing = ModelCore::new(42, Weak::new());
        assert_eq!(existing.pkey(), 42);
    }

    #[test]
    fn datetime_round_trips_through_value() {
        let now = Utc::now();
        let value = datetime_to_value(Some(now));
        let parsed = value_to_datetime(&value).unwrap();
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
        assert!(value_to_datetime(&Value::Null).is_none());
    }

    #[test]
    fn common_field_values_through_core() {
        let mut core = ModelCore::new(7, Weak::new());
        assert_eq!(core.value(PKEY), Value::from(7));
        assert_eq!(core.value(DELETE_FLAG), Value::Null);

        assert!(core.set_value(DELETE_FLAG, &Value::from(1)));
        assert_eq!(core.delete_flag(), Some(true));
        assert!(core.set_value(DELETE_FLAG, &Value::Bool(false)));
        assert_eq!(core.delete_flag(), Some(false));

        assert!(!core.set_value("unknown", &Value::Null));
    }
}
