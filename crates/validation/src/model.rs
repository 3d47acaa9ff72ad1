//! Model-level validation scenarios.
//!
//! A model validator composes field validators for the three scenarios
//! of a model's life: creation (mandatory constraints on the business
//! fields), selection (lenient re-check of fetched data) and update
//! (mandatory re-check of changed data). Implementations consume and
//! return `self` so scenarios chain off a `start` constructor:
//!
//! ```ignore
//! let results = UserOrgValidator::start(&org).create().end();
//! assert!(results.is_ok());
//! ```

use crate::results::Results;

pub trait ModelValidator: Sized {
    /// Validate a fresh, unsaved model.
    fn create(self) -> Self;

    /// Validate fetched data, typically leniently.
    fn select(self) -> Self;

    /// Re-validate a changed model.
    fn update(self) -> Self;

    /// Hand back the accumulated results.
    fn end(self) -> Results;
}
