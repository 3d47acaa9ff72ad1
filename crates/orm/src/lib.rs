//! # kiroku-orm: write-buffering active-record core
//!
//! A lazy-loading, write-buffering active-record layer: declarative
//! field definitions, identity-mapped model handles with pseudo-key
//! lifecycle, per-type logic instances buffering creates and updates,
//! dependent-model cascading save, and backend-agnostic query
//! rendering.
//!
//! Execution is single-threaded and request-scoped: a [`Registry`]
//! owns the backend and one [`Logic`] per model type, and everything is
//! shared through `Rc`. Storage calls are synchronous; the caller owns
//! transaction boundaries.

pub mod backend;
pub mod error;
pub mod field;
pub mod logic;
pub mod model;
pub mod query;
pub mod registry;

#[cfg(test)]
mod tests;

pub use backend::{Backend, Params, Row};
pub use error::{DbError, OrmError, OrmResult};
pub use field::{FieldDef, FieldSet, LogicalType, StorageType};
pub use logic::{Logic, LogicObject};
pub use model::{
    act_base, common_fields, datetime_to_value, model_field_set, next_pseudo_pkey,
    value_to_datetime, DependentModel, Model, ModelCore, ModelType, CREATE_DATE, DELETE_FLAG,
    PKEY, UPDATE_DATE,
};
pub use query::{Cond, Op, OpTable, Query};
pub use registry::Registry;
