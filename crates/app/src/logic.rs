//! Application logic wrappers.
//!
//! Thin newtypes over the generic [`Logic`] adding the app-level query
//! helpers. They deref to the underlying logic, so the full CRUD
//! surface stays available.

use std::ops::Deref;
use std::rc::Rc;

use serde_json::json;

use kiroku_orm::{Cond, Logic, Op, OrmResult, Params, Registry};

use crate::models::{User, UserOrg};

pub struct UserLogic {
    logic: Rc<Logic<User>>,
}

impl UserLogic {
    pub fn new(registry: &Rc<Registry>) -> Self {
        Self {
            logic: registry.register::<User>(),
        }
    }

    /// Identity-mapped user handle for `pkey`; 0 starts a new user.
    pub fn get(&self, pkey: i64) -> User {
        self.logic.get_model(pkey)
    }

    /// Look a user up by exact name.
    pub fn get_by_name(&self, name: &str) -> OrmResult<Option<User>> {
        let query = self.logic.query(vec![Cond::new(User::NAME, Op::Eq)]);
        let mut params = Params::new();
        params.insert(":name".to_string(), json!(name));
        let users = self.logic.select(&query, &params, false)?;
        Ok(users.into_iter().next())
    }
}

impl Deref for UserLogic {
    type Target = Logic<User>;

    fn deref(&self) -> &Self::Target {
        &self.logic
    }
}

pub struct UserOrgLogic {
    logic: Rc<Logic<UserOrg>>,
}

impl UserOrgLogic {
    pub fn new(registry: &Rc<Registry>) -> Self {
        Self {
            logic: registry.register::<UserOrg>(),
        }
    }

    /// Identity-mapped organization handle for `pkey`; 0 starts a new
    /// organization.
    pub fn get(&self, pkey: i64) -> UserOrg {
        self.logic.get_model(pkey)
    }
}

impl Deref for UserOrgLogic {
    type Target = Logic<UserOrg>;

    fn deref(&self) -> &Self::Target {
        &self.logic
    }
}
