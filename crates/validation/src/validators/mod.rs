//! Per-kind field validators.
//!
//! Each validator is a stateless value composing the
//! [`FieldCheck`](crate::field::FieldCheck) pipeline for one kind of
//! field. Instances are created fresh per call:
//!
//! ```ignore
//! let ok = IntValidator::new()
//!     .check(FieldCheck::start(&mut subject, "rank", &mut results), true)
//!     .end();
//! ```

mod ascii_name;
mod email;
mod int;
mod jp_name;
mod password;

pub use ascii_name::AsciiNameValidator;
pub use email::EmailValidator;
pub use int::IntValidator;
pub use jp_name::JpNameValidator;
pub use password::PasswordValidator;
