//! Shared fixture plumbing for the end-to-end suites.

#![allow(dead_code)]

use std::time::Duration;

use tempfile::TempDir;

use ferrymail_uitest::mock::{MockApp, MockCapture};
use ferrymail_uitest::pages::{HomeChecks, HomePage, LoginPage};
use ferrymail_uitest::{
    AccountCatalog, AppWindow, Session, SessionConfig, TestOutcome, WaitPolicy,
};

/// Short budgets keep the simulated client honest without real-time sleeps.
fn fast_policy() -> WaitPolicy {
    WaitPolicy::new(25, Duration::from_millis(1))
}

/// One launched client per test: session plus the page objects' window.
pub struct Fixture {
    pub app: MockApp,
    pub session: Session,
    pub accounts: AccountCatalog,
    artifacts: TempDir,
}

/// Launch the simulated client and wait for its window.
pub fn launch(test_name: &str) -> Fixture {
    ferrymail_uitest::logging::init();

    let app = MockApp::new();
    let accounts = AccountCatalog::builtin();
    let artifacts = tempfile::tempdir().expect("artifact dir");
    let session = Session::start(
        test_name,
        Box::new(app.driver()),
        Box::new(app.credentials()),
        Some(Box::new(MockCapture::new())),
        SessionConfig::default()
            .with_window_policy(fast_policy())
            .with_locator_policy(fast_policy())
            .with_artifact_dir(artifacts.path()),
    )
    .expect("client failed to launch");

    Fixture {
        app,
        session,
        accounts,
        artifacts,
    }
}

impl Fixture {
    pub fn window(&self) -> AppWindow {
        self.session.window().expect("main window")
    }

    pub fn login(&self) -> LoginPage {
        LoginPage::new(&self.window())
    }

    pub fn home(&self) -> HomePage {
        HomePage::new(&self.window())
    }

    pub fn checks(&self) -> HomeChecks {
        HomeChecks::new(&self.window())
    }

    /// Scenario cleanup mirroring the client's expected end state: drop
    /// the account when one is still listed, then tear the session down.
    pub fn finish_removing_account(self) {
        self.home().remove_account().expect("account cleanup");
        self.session.finish(TestOutcome::Passed);
    }

    /// Tear the session down without touching accounts.
    pub fn finish(self) {
        self.session.finish(TestOutcome::Passed);
    }
}
