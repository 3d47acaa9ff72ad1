//! Organization validation scenarios.

use kiroku_orm::{ModelType, Row};
use kiroku_validation::{
    EmailValidator, FieldCheck, JpNameValidator, ModelValidator, Results, Subject,
};

use crate::models::UserOrg;

pub struct UserOrgValidator<'a> {
    subject: Subject<'a>,
    results: Results,
}

impl<'a> UserOrgValidator<'a> {
    pub fn start(org: &'a UserOrg) -> Self {
        Self {
            subject: Subject::model(org),
            results: Results::new(),
        }
    }

    /// Validate a raw row instead of a live model.
    pub fn start_row(row: &'a mut Row) -> Self {
        Self {
            subject: Subject::row(row, UserOrg::field_set()),
            results: Results::new(),
        }
    }

    fn pass(&mut self, mandatory: bool) {
        let results = &mut self.results;
        JpNameValidator::new()
            .check(
                FieldCheck::start(&mut self.subject, UserOrg::NAME, results),
                mandatory,
            )
            .end();
        EmailValidator::new()
            .check(
                FieldCheck::start(&mut self.subject, UserOrg::EMAIL, results),
                mandatory,
            )
            .end();
        JpNameValidator::new()
            .check(
                FieldCheck::start(&mut self.subject, UserOrg::ADDRESS, results),
                mandatory,
            )
            .end();
    }
}

impl ModelValidator for UserOrgValidator<'_> {
    fn create(mut self) -> Self {
        self.pass(true);
        self
    }

    fn select(mut self) -> Self {
        self.pass(true);
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
