//! Account state scenarios: split address mode and suite-level runs.

mod common;

use std::time::Duration;

use common::launch;
use ferrymail_uitest::mock::{MockApp, MockCapture};
use ferrymail_uitest::pages::{HomeChecks, LoginPage};
use ferrymail_uitest::{
    AccountCatalog, Session, SessionConfig, TestCase, TestHarness, TestStatus, TestSuite,
    WaitPolicy,
};

#[test]
fn verify_split_addresses_is_disabled_by_default() {
    let fixture = launch("verify_split_addresses_is_disabled_by_default");
    fixture.login().sign_in(&fixture.accounts.paid).unwrap();
    fixture.checks().split_addresses_disabled().unwrap();
    fixture.finish_removing_account();
}

#[test]
fn enable_and_disable_split_address_mode() {
    let fixture = launch("enable_and_disable_split_address_mode");
    fixture.login().sign_in(&fixture.accounts.paid).unwrap();
    let home = fixture.home();
    let checks = fixture.checks();

    home.enable_split_addresses().unwrap();
    checks.split_addresses_enabled().unwrap();
    home.disable_split_addresses().unwrap();
    checks.split_addresses_disabled().unwrap();
    fixture.finish_removing_account();
}

#[test]
fn harness_runs_scripted_suite_with_report() {
    ferrymail_uitest::logging::init();
    let artifacts = tempfile::tempdir().unwrap();
    let artifact_dir = artifacts.path().to_path_buf();

    let factory = move |test_name: &str| {
        let app = MockApp::new();
        Session::start(
            test_name,
            Box::new(app.driver()),
            Box::new(app.credentials()),
            Some(Box::new(MockCapture::new())),
            SessionConfig::default()
                .with_window_policy(WaitPolicy::new(25, Duration::from_millis(1)))
                .with_locator_policy(WaitPolicy::new(25, Duration::from_millis(1)))
                .with_artifact_dir(artifact_dir.clone()),
        )
    };

    let suite = TestSuite::new("login_smoke")
        .with_test(TestCase::new("paid_user_signs_in", |session| {
            let window = session.window()?;
            let accounts = AccountCatalog::builtin();
            LoginPage::new(&window).sign_in(&accounts.paid)?;
            HomeChecks::new(&window).logged_in()?;
            Ok(())
        }))
        .with_test(TestCase::new("free_user_is_rejected", |session| {
            let window = session.window()?;
            let accounts = AccountCatalog::builtin();
            LoginPage::new(&window).sign_in(&accounts.free)?;
            HomeChecks::new(&window)
                .free_account_error(ferrymail_uitest::pages::FREE_PLAN_NOTICE)?;
            Ok(())
        }))
        .with_test(TestCase::new("wrong_password_is_rejected", |session| {
            let window = session.window()?;
            LoginPage::new(&window).sign_in(&AccountCatalog::incorrect())?;
            HomeChecks::new(&window).incorrect_credentials_error()?;
            Ok(())
        }));

    let results = TestHarness::new().run(&suite, &factory);

    assert_eq!(results.total(), 3);
    assert!(results.all_passed(), "failures: {:?}", results.failures());
    assert!(results
        .results
        .iter()
        .all(|entry| entry.status == TestStatus::Passed));

    let report = artifacts.path().join("reports/login_smoke.json");
    results.write_json_report(&report).unwrap();
    assert!(report.is_file());
}
