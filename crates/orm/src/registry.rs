//! Explicit registry of logic instances.
//!
//! One registry per request/unit of work owns the backend handle and
//! exactly one [`Logic`] per registered model type. Passing it by
//! reference replaces any process-global lookup; model handles keep a
//! weak back-reference so lazy activation can reach their logic without
//! creating ownership cycles.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::backend::Backend;
use crate::logic::{Logic, LogicObject};
use crate::model::ModelType;

struct LogicEntry {
    object: Rc<dyn LogicObject>,
    any: Rc<dyn Any>,
}

pub struct Registry {
    backend: Rc<dyn Backend>,
    logics: RefCell<HashMap<&'static str, LogicEntry>>,
    weak_self: Weak<Registry>,
}

impl Registry {
    pub fn new(backend: Rc<dyn Backend>) -> Rc<Self> {
        Rc::new_cyclic(|weak_self| Self {
            backend,
            logics: RefCell::new(HashMap::new()),
            weak_self: weak_self.clone(),
        })
    }

    pub fn backend(&self) -> Rc<dyn Backend> {
        self.backend.clone()
    }

    /// The logic for model type `M`, created on first registration.
    pub fn register<M: ModelType>(&self) -> Rc<Logic<M>> {
        if let Some(logic) = self.logic::<M>() {
            return logic;
        }
        let logic = Rc::new(Logic::<M>::new(self.weak_self.clone(), self.backend.clone()));
        self.logics.borrow_mut().insert(
            M::MODEL_NAME,
            LogicEntry {
                object: logic.clone(),
                any: logic.clone(),
            },
        );
        tracing::debug!(model = M::MODEL_NAME, "logic registered");
        logic
    }

    /// The logic for model type `M`, if registered.
    pub fn logic<M: ModelType>(&self) -> Option<Rc<Logic<M>>> {
        let logics = self.logics.borrow();
        let entry = logics.get(M::MODEL_NAME)?;
        entry.any.clone().downcast::<Logic<M>>().ok()
    }

    /// Name-keyed lookup used by cascade saves and reference resolution.
    pub fn logic_by_name(&self, model_name: &str) -> Option<Rc<dyn LogicObject>> {
        self.logics
            .borrow()
            .get(model_name)
            .map(|entry| entry.object.clone())
    }

    /// Names of all registered model types.
    pub fn model_names(&self) -> Vec<&'static str> {
        self.logics.borrow().keys().copied().collect()
    }
}
