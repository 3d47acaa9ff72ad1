//! Model-level validation scenarios over live models and raw rows.

use std::rc::Rc;

use serde_json::json;

use kiroku_app::{User, UserLogic, UserOrg, UserOrgLogic, UserOrgValidator, UserValidator};
use kiroku_orm::backend::memory::MemoryBackend;
use kiroku_orm::{Registry, Row};
use kiroku_validation::ModelValidator;

fn setup() -> (Rc<Registry>, UserLogic, UserOrgLogic) {
    let backend = Rc::new(MemoryBackend::new());
    let registry = Registry::new(backend);
    let users = UserLogic::new(&registry);
    let orgs = UserOrgLogic::new(&registry);
    (registry, users, orgs)
}

fn fresh_org(orgs: &UserOrgLogic) -> UserOrg {
    let org = orgs.get(0);
    org.set_name("テスト会社")
        .set_email("a@example.com")
        .set_address("東京都千代田区1-1");
    org
}

#[test]
fn well_formed_organization_passes_create() {
    let (_registry, _users, orgs) = setup();
    let org = fresh_org(&orgs);

    let results = UserOrgValidator::start(&org).create().end();
    assert!(results.is_ok(), "unexpected results: {results}");

    // normalization wrote the full-width address back onto the model
    assert_eq!(org.address().as_deref(), Some("東京都千代田区１－１"));
}

#[test]
fn stray_half_width_symbol_fails_create() {
    let (_registry, _users, orgs) = setup();
    let org = fresh_org(&orgs);
    org.set_address("東京都千代田区1-1@ビル");

    let results = UserOrgValidator::start(&org).create().end();
    assert!(!results.is_ok());
    assert!(results.has_errors_for(UserOrg::ADDRESS));
}

#[test]
fn missing_mandatory_fields_accumulate_instead_of_failing_fast() {
    let (_registry, _users, orgs) = setup();
    let org = orgs.get(0);
    org.set_name("テスト会社");

    let results = UserOrgValidator::start(&org).create().end();
    assert!(!results.is_ok());
    assert!(results.has_errors_for(UserOrg::EMAIL));
    assert!(results.has_errors_for(UserOrg::ADDRESS));
    assert_eq!(results.error_count(), 2);
}

#[test]
fn valid_user_passes_and_password_is_hashed() {
    let (_registry, users, _orgs) = setup();
    let user = users.get(0);
    user.set_name("sato.jiro")
        .set_email("sato@example.com")
        .set_password("s3cret!9")
        .set_belong_id(1);

    let results = UserValidator::start(&user).create().end();
    assert!(results.is_ok(), "unexpected results: {results}");

    let stored = user.password().unwrap();
    assert_ne!(stored, "s3cret!9");
    assert!(bcrypt::verify("s3cret!9", &stored).unwrap());
}

#[test]
fn letters_only_password_reports_both_missing_classes() {
    let (_registry, users, _orgs) = setup();
    let user = users.get(0);
    user.set_name("sato.jiro")
        .set_email("sato@example.com")
        .set_password("abcdefgh")
        .set_belong_id(1);

    let results = UserValidator::start(&user).create().end();
    assert!(!results.is_ok());
    let password_errors = results
        .errors()
        .filter(|entry| entry.source == User::PASSWORD)
        .count();
    assert!(password_errors >= 2);
}

#[test]
fn select_scenario_is_lenient_about_missing_fields() {
    let (_registry, _users, _orgs) = setup();
    let mut row = Row::new();
    row.insert(User::NAME.to_string(), json!("hara.jun"));

    let results = UserValidator::start_row(&mut row).select().end();
    assert!(results.is_ok(), "unexpected results: {results}");
}

#[test]
fn row_subjects_receive_normalized_values() {
    let (_registry, _users, _orgs) = setup();
    let mut row = Row::new();
    row.insert(UserOrg::NAME.to_string(), json!("テスト会社"));
    row.insert(UserOrg::EMAIL.to_string(), json!("ｉｎｆｏ@example.com"));
    row.insert(UserOrg::ADDRESS.to_string(), json!("東京都港区芝公園4-2-8"));

    let results = UserOrgValidator::start_row(&mut row).create().end();
    assert!(results.is_ok(), "unexpected results: {results}");
    assert_eq!(row.get(UserOrg::EMAIL), Some(&json!("info@example.com")));
    assert_eq!(
        row.get(UserOrg::ADDRESS),
        Some(&json!("東京都港区芝公園４－２－８"))
    );
}
