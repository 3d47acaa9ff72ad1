//! # kiroku-validation: accumulating field and model validation
//!
//! Validators normalize and constrain field values, gathering every
//! diagnostic of a pass in one [`Results`] accumulator instead of
//! failing fast. A pass runs against either a live model or a raw row
//! (see [`Subject`]); per-kind validators compose the shared
//! [`FieldCheck`] pipeline, and model validators bundle them into
//! create/select/update scenarios.

pub mod field;
pub mod model;
pub mod results;
pub mod validators;
pub mod width;

pub use field::{FieldCheck, Subject};
pub use model::ModelValidator;
pub use results::{Entry, Level, Results};
pub use validators::{
    AsciiNameValidator, EmailValidator, IntValidator, JpNameValidator, PasswordValidator,
};
