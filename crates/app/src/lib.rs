//! # kiroku-app: example application layer
//!
//! The `User`/`UserOrg` pair exercises the whole stack: declarative
//! field sets, lazy-loading handles, the belongs-to reference with
//! cascading save, and the create/select/update validation scenarios.

pub mod logic;
pub mod models;
pub mod validate;

pub use logic::{UserLogic, UserOrgLogic};
pub use models::{User, UserOrg};
pub use validate::{UserOrgValidator, UserValidator};
