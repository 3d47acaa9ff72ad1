//! User validation scenarios.

use kiroku_orm::{ModelType, Row};
use kiroku_validation::{
    AsciiNameValidator, EmailValidator, FieldCheck, IntValidator, ModelValidator,
    PasswordValidator, Results, Subject,
};

use crate::models::User;

pub struct UserValidator<'a> {
    subject: Subject<'a>,
    results: Results,
}

impl<'a> UserValidator<'a> {
    pub fn start(user: &'a User) -> Self {
        Self {
            subject: Subject::model(user),
            results: Results::new(),
        }
    }

    /// Validate a raw row instead of a live model.
    pub fn start_row(row: &'a mut Row) -> Self {
        Self {
            subject: Subject::row(row, User::field_set()),
            results: Results::new(),
        }
    }

    fn pass(&mut self, mandatory: bool) {
        let results = &mut self.results;
        AsciiNameValidator::new()
            .check(
                FieldCheck::start(&mut self.subject, User::NAME, results),
                mandatory,
            )
            .end();
        PasswordValidator::new()
            .check(
                FieldCheck::start(&mut self.subject, User::PASSWORD, results),
                mandatory,
            )
            .end();
        EmailValidator::new()
            .check(
                FieldCheck::start(&mut self.subject, User::EMAIL, results),
                mandatory,
            )
            .end();
        IntValidator::new()
            .check(
                FieldCheck::start(&mut self.subject, User::BELONG_ID, results),
                mandatory,
            )
            .end();
    }
}

impl ModelValidator for UserValidator<'_> {
    fn create(mut self) -> Self {
        self.pass(true);
        self
    }

    fn select(mut self) -> Self {
        self.pass(false);
        self
    }

    fn update(mut self) -> Self {
        self.pass(true);
        self
    }

    fn end(self) -> Results {
        self.results
    }
}
