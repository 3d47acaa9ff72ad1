//! Per-model-type CRUD orchestration.
//!
//! One [`Logic`] exists per model type, owned by the
//! [`Registry`](crate::registry::Registry). It canonicalizes handles
//! through an identity map, buffers pending creates and updates, and
//! flushes them in a two-phase save that cascades to dependent models
//! first so foreign keys are valid by the time the owner is written.
//!
//! Failure policy: a backend error aborts the current save phase and
//! leaves the buffers untouched, so a retry re-attempts the same
//! models. A missing row is a normal negative outcome (`Ok(false)`),
//! never an error.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::{Rc, Weak};

use chrono::Utc;
use serde_json::Value;

use crate::backend::{Backend, Params};
use crate::error::{OrmError, OrmResult};
use crate::model::{
    datetime_to_value, Model, ModelType, CREATE_DATE, DELETE_FLAG, PKEY, UPDATE_DATE,
};
use crate::query::{Cond, Query};
use crate::registry::Registry;

/// Object-safe facade over a [`Logic`], used for name-keyed dispatch
/// during cascade saves and reference resolution.
pub trait LogicObject {
    fn model_name(&self) -> &'static str;

    fn table_name(&self) -> &'static str;

    fn save(&self) -> OrmResult<()>;

    /// Identity-mapped handle for `pkey`, constructing a non-activated
    /// one when absent.
    fn get_model_boxed(&self, pkey: i64) -> Box<dyn Model>;

    /// Drop a model from the pending-update buffer.
    fn remove_update(&self, pkey: i64);
}

struct LogicState<M> {
    /// Identity map covering pseudo and real keys.
    models: HashMap<i64, M>,
    /// Pending inserts, in registration order.
    created: Vec<M>,
    /// Pseudo-keys already present in `created`, so re-registration of
    /// the same new entity stays idempotent.
    buffered: HashSet<i64>,
    /// Pending updates by key. Ordered so flushes are deterministic.
    updated: BTreeMap<i64, M>,
    /// Per-logic pseudo-key counter, distinct from the process-wide one
    /// used at handle construction.
    next_pseudo: i64,
}

impl<M> Default for LogicState<M> {
    fn default() -> Self {
        Self {
            models: HashMap::new(),
            created: Vec::new(),
            buffered: HashSet::new(),
            updated: BTreeMap::new(),
            next_pseudo: 0,
        }
    }
}

/// CRUD orchestration for one model type.
pub struct Logic<M: ModelType> {
    registry: Weak<Registry>,
    backend: Rc<dyn Backend>,
    state: RefCell<LogicState<M>>,
}

impl<M: ModelType> Logic<M> {
    pub(crate) fn new(registry: Weak<Registry>, backend: Rc<dyn Backend>) -> Self {
        Self {
            registry,
            backend,
            state: RefCell::new(LogicState::default()),
        }
    }

    /// Register a handle under its primary key and return the canonical
    /// instance for that key.
    ///
    /// A pkey of 0 is assigned a fresh pseudo-key first. When another
    /// instance already occupies the key, the incoming one is discarded
    /// in favor of the existing one — callers must keep working with the
    /// returned handle. A never-persisted key enters the created buffer
    /// exactly once; otherwise `updated` enrolls the model for the next
    /// update flush.
    pub fn register(&self, model: M, updated: bool) -> M {
        let mut pkey = model.pkey();
        if pkey == 0 {
            let mut state = self.state.borrow_mut();
            state.next_pseudo -= 1;
            pkey = state.next_pseudo;
            model.set_pkey(pkey);
        }
        let mut state = self.state.borrow_mut();
        let model = match state.models.get(&pkey) {
            Some(existing) => existing.clone(),
            None => model,
        };
        if pkey <= 0 && !state.buffered.contains(&pkey) {
            state.created.push(model.clone());
            state.buffered.insert(pkey);
            tracing::debug!(model = M::MODEL_NAME, pkey, "buffered for create");
        } else if updated {
            state.updated.insert(pkey, model.clone());
        }
        state.models.insert(pkey, model.clone());
        model
    }

    /// Identity-mapped handle for `pkey`; on a miss a non-activated
    /// handle is constructed and registered. A pkey of 0 allocates a
    /// fresh pseudo-key, making this the "new entity" entry point.
    /// No storage access happens here — the handle loads itself lazily.
    pub fn get_model(&self, pkey: i64) -> M {
        if let Some(model) = self.state.borrow().models.get(&pkey) {
            return model.clone();
        }
        let pkey = if pkey == 0 {
            let mut state = self.state.borrow_mut();
            state.next_pseudo -= 1;
            state.next_pseudo
        } else {
            pkey
        };
        let model = M::construct(pkey, self.registry.clone());
        self.register(model, false)
    }

    /// Load one row by the model's primary key and populate the model.
    ///
    /// Returns `Ok(false)` when the key is not positive or the row does
    /// not exist. With `lock`, the row is locked for update and the
    /// model enrolls in the pending-update buffer.
    pub fn load(&self, model: &M, lock: bool) -> OrmResult<bool> {
        let pkey = model.pkey();
        if pkey <= 0 {
            return Ok(false);
        }
        let Some(row) = self.backend.get(M::TABLE, pkey, M::field_set(), lock)? else {
            tracing::debug!(model = M::MODEL_NAME, pkey, "load found no row");
            return Ok(false);
        };
        model.from_map(&row, true, false)?;
        if lock {
            self.state.borrow_mut().updated.insert(pkey, model.clone());
        }
        tracing::debug!(model = M::MODEL_NAME, pkey, lock, "loaded");
        Ok(true)
    }

    /// Two-phase flush of the pending buffers.
    ///
    /// Phase 1 persists created models: dependents are saved first and
    /// their keys written back, then each model receives the next
    /// sequential key past the stored maximum, creation/update stamps
    /// and a cleared delete flag, and the batch goes to the backend.
    /// Phase 2 persists updated models with a fresh update stamp.
    /// A backend failure aborts the running phase with buffers intact.
    pub fn save(&self) -> OrmResult<()> {
        let table = M::TABLE;
        let key_column = M::field_set().column(PKEY).unwrap_or(PKEY);

        let created: Vec<M> = self.state.borrow().created.clone();
        if !created.is_empty() {
            let mut last_pkey = self.backend.get_max(table, key_column)?;
            let now = datetime_to_value(Some(Utc::now()));
            let mut rows = Vec::with_capacity(created.len());
            for model in &created {
                self.save_depends(model)?;
                last_pkey += 1;
                model.set_pkey(last_pkey);
                model.set_value(CREATE_DATE, &now, false)?;
                model.set_value(UPDATE_DATE, &now, false)?;
                model.set_value(DELETE_FLAG, &Value::Bool(false), false)?;
                rows.push(model.to_map(None)?);
            }
            self.backend
                .create(table, &rows, M::field_set(), true)
                .inspect_err(|error| {
                    tracing::error!(
                        model = M::MODEL_NAME,
                        rows = rows.len(),
                        %error,
                        "create phase failed, buffers retained"
                    );
                })?;
            let mut state = self.state.borrow_mut();
            state.created.clear();
            state.buffered.clear();
            // the freshly assigned keys join the identity map; the
            // pseudo-key entries stay behind as aliases
            for model in &created {
                state.models.insert(model.pkey(), model.clone());
            }
            tracing::debug!(model = M::MODEL_NAME, rows = created.len(), "created");
        }

        let updated: Vec<M> = self.state.borrow().updated.values().cloned().collect();
        if !updated.is_empty() {
            let now = datetime_to_value(Some(Utc::now()));
            let mut rows = Vec::with_capacity(updated.len());
            for model in &updated {
                self.save_depends(model)?;
                model.set_value(UPDATE_DATE, &now, false)?;
                rows.push(model.to_map(None)?);
            }
            self.backend
                .update(table, &rows, M::field_set(), true)
                .inspect_err(|error| {
                    tracing::error!(
                        model = M::MODEL_NAME,
                        rows = rows.len(),
                        %error,
                        "update phase failed, buffers retained"
                    );
                })?;
            self.state.borrow_mut().updated.clear();
            tracing::debug!(model = M::MODEL_NAME, rows = updated.len(), "updated");
        }

        Ok(())
    }

    /// Persist the models this one references before it is written
    /// itself, then copy the (now valid) keys into the foreign-key
    /// fields.
    fn save_depends(&self, model: &M) -> OrmResult<()> {
        for dependent in model.dependent_models() {
            let Some(target) = model.get_ref(dependent.field) else {
                continue;
            };
            let registry = self
                .registry
                .upgrade()
                .ok_or_else(|| OrmError::Relationship("registry was dropped".to_string()))?;
            let logic = registry.logic_by_name(dependent.model_name).ok_or_else(|| {
                OrmError::Relationship(format!(
                    "no logic registered for model '{}'",
                    dependent.model_name
                ))
            })?;
            logic.save()?;
            model.set_value(dependent.key_field, &Value::from(target.pkey()), false)?;
        }
        Ok(())
    }

    /// Execute a query and build one full model per returned row.
    ///
    /// Rows enter the identity map through `get_model`, so repeated
    /// selects keep handing out the same instances. For every
    /// model-reference field whose foreign key came back positive, the
    /// referenced model is attached as a non-activated placeholder that
    /// fetches itself on first access.
    pub fn select(&self, query: &Query, params: &Params, lock: bool) -> OrmResult<Vec<M>> {
        let rows = self.backend.select(query, params, lock)?;
        let mut models = Vec::with_capacity(rows.len());
        for row in &rows {
            let pkey = row.get(PKEY).and_then(Value::as_i64).unwrap_or(0);
            let model = self.get_model(pkey);
            model.from_map(row, true, false)?;
            self.attach_refs(&model)?;
            models.push(model);
        }
        tracing::debug!(model = M::MODEL_NAME, rows = models.len(), "select");
        Ok(models)
    }

    fn attach_refs(&self, model: &M) -> OrmResult<()> {
        let Some(registry) = self.registry.upgrade() else {
            return Ok(());
        };
        for dependent in model.dependent_models() {
            let foreign = model.get_value(dependent.key_field)?;
            let Some(foreign) = foreign.as_i64().filter(|pkey| *pkey > 0) else {
                continue;
            };
            let Some(logic) = registry.logic_by_name(dependent.model_name) else {
                continue;
            };
            let target = logic.get_model_boxed(foreign);
            model.set_ref(dependent.field, target.as_ref())?;
        }
        Ok(())
    }

    /// Build a query over this model type's table and field set.
    pub fn query(&self, conds: Vec<Cond>) -> Query {
        Query::new(M::TABLE, M::field_set(), conds)
    }

    /// Withdraw a model from the pending-update buffer. The model stays
    /// activated; see [`Model::deactivate`] for the stronger form.
    pub fn cancel(&self, model: &M) {
        self.state.borrow_mut().updated.remove(&model.pkey());
    }

    /// Soft delete: flag the row instead of removing it. The change is
    /// buffered like any other field write and rides the next save.
    pub fn delete(&self, model: &M) -> OrmResult<()> {
        model.set_value(DELETE_FLAG, &Value::Bool(true), true)
    }

    /// Hard delete by primary key.
    // TODO: needs a delete operation on Backend before this can do anything
    pub fn delete_physical(&self, _model: &M) -> OrmResult<()> {
        Ok(())
    }

    /// Number of models buffered for create.
    pub fn pending_creates(&self) -> usize {
        self.state.borrow().created.len()
    }

    /// Number of models buffered for update.
    pub fn pending_updates(&self) -> usize {
        self.state.borrow().updated.len()
    }

    /// Whether the identity map currently holds `pkey`.
    pub fn knows(&self, pkey: i64) -> bool {
        self.state.borrow().models.contains_key(&pkey)
    }
}

impl<M: ModelType> LogicObject for Logic<M> {
    fn model_name(&self) -> &'static str {
        M::MODEL_NAME
    }

    fn table_name(&self) -> &'static str {
        M::TABLE
    }

    fn save(&self) -> OrmResult<()> {
        Logic::save(self)
    }

    fn get_model_boxed(&self, pkey: i64) -> Box<dyn Model> {
        Box::new(self.get_model(pkey))
    }

    fn remove_update(&self, pkey: i64) {
        self.state.borrow_mut().updated.remove(&pkey);
    }
}
