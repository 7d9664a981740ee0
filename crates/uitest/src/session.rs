//! Application session fixture.
//!
//! One [`Session`] is constructed per test: it launches the client through
//! an [`AppDriver`], resolves the main window through the wait engine, and
//! guarantees teardown (failure screenshot, process termination, credential
//! cleanup) whether the test finishes normally or not. Nothing about the
//! session is process-global; concurrent tests each own an independent one.
//!
//! Teardown steps are best-effort: a failing cleanup is logged and never
//! replaces the test outcome.

use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::locator::{Locator, Selector, UiElement, DEFAULT_LOCATOR_POLICY};
use crate::result::{UitestError, UitestResult};
use crate::wait::{wait_until_action_succeeds, WaitPolicy};

/// Launches and terminates the client process.
///
/// Real bindings wrap a process launcher plus window attach; the mock
/// backend implements the same contract in memory.
pub trait AppDriver: Send {
    /// Start the client
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::Session`] when the client cannot be started.
    fn launch(&mut self) -> UitestResult<()>;

    /// Whether the client process is currently running
    fn is_running(&self) -> bool;

    /// Resolve the current main window root.
    ///
    /// The window may lag the process during startup, so callers retry
    /// this through the wait engine rather than treating one failure as
    /// fatal.
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::WindowUnavailable`] while no window exists.
    fn main_window(&self) -> UitestResult<UiElement>;

    /// Stop the client
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::Session`] when termination fails.
    fn terminate(&mut self) -> UitestResult<()>;
}

/// Removes credentials the client persisted during a test
pub trait CredentialStore: Send {
    /// Delete any stored bridge credentials
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::Session`] when cleanup fails.
    fn clear(&mut self) -> UitestResult<()>;
}

/// Captures the screen for failure diagnostics
pub trait ScreenCapture: Send {
    /// Capture the current screen as encoded image bytes
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::Capture`] when capturing fails.
    fn capture(&self) -> UitestResult<Vec<u8>>;
}

/// How a test ended, for teardown decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    /// Test finished without error
    Passed,
    /// Test failed or never reached its end
    Failed,
}

/// Session tuning
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Retry budget for resolving the main window
    pub window_policy: WaitPolicy,
    /// Retry budget handed to every locator created from this session
    pub locator_policy: WaitPolicy,
    /// Directory failure screenshots are written to
    pub artifact_dir: PathBuf,
    /// Whether to capture a screenshot when a test fails
    pub capture_on_failure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window_policy: WaitPolicy::default(),
            locator_policy: DEFAULT_LOCATOR_POLICY,
            artifact_dir: PathBuf::from("artifacts/screenshots"),
            capture_on_failure: true,
        }
    }
}

impl SessionConfig {
    /// Set the window resolution budget
    #[must_use]
    pub const fn with_window_policy(mut self, policy: WaitPolicy) -> Self {
        self.window_policy = policy;
        self
    }

    /// Set the locator retry budget
    #[must_use]
    pub const fn with_locator_policy(mut self, policy: WaitPolicy) -> Self {
        self.locator_policy = policy;
        self
    }

    /// Set the artifact directory
    #[must_use]
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    /// Enable or disable failure screenshots
    #[must_use]
    pub const fn with_capture_on_failure(mut self, capture: bool) -> Self {
        self.capture_on_failure = capture;
        self
    }
}

/// The resolved main window, factory for scoped locators
#[derive(Debug, Clone)]
pub struct AppWindow {
    root: UiElement,
    policy: WaitPolicy,
}

impl AppWindow {
    /// The window root element
    #[must_use]
    pub const fn root(&self) -> &UiElement {
        &self.root
    }

    /// Retry budget this window hands to its locators
    #[must_use]
    pub const fn policy(&self) -> WaitPolicy {
        self.policy
    }

    /// A locator for elements beneath this window
    #[must_use]
    pub fn locator(&self, selector: Selector) -> Locator {
        Locator::new(self.root.clone(), selector).with_policy(self.policy)
    }

    /// First match right now, if any; used for optional elements that may
    /// legitimately be absent (no waiting, no error)
    #[must_use]
    pub fn try_find(&self, selector: &Selector) -> Option<UiElement> {
        self.root.try_find_first(selector)
    }
}

/// Per-test fixture owning the client lifecycle
pub struct Session {
    id: Uuid,
    test_name: String,
    driver: Box<dyn AppDriver>,
    credentials: Box<dyn CredentialStore>,
    capture: Option<Box<dyn ScreenCapture>>,
    config: SessionConfig,
    finished: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("test_name", &self.test_name)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Launch the client and wait until its main window is resolvable.
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::Session`] when the launch fails and
    /// [`UitestError::WindowUnavailable`] when no window appears within
    /// the window budget.
    pub fn start(
        test_name: impl Into<String>,
        driver: Box<dyn AppDriver>,
        credentials: Box<dyn CredentialStore>,
        capture: Option<Box<dyn ScreenCapture>>,
        config: SessionConfig,
    ) -> UitestResult<Self> {
        let test_name = test_name.into();
        let mut driver = driver;
        info!(test = %test_name, "launching client");
        driver.launch()?;

        let session = Self {
            id: Uuid::new_v4(),
            test_name,
            driver,
            credentials,
            capture,
            config,
            finished: false,
        };
        // fail the fixture early if the window never comes up
        session.window()?;
        Ok(session)
    }

    /// Unique id of this run, used in artifact names
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the test this session belongs to
    #[must_use]
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Resolve a fresh main-window handle.
    ///
    /// Window handles go stale when the client rebuilds its UI, so callers
    /// re-resolve instead of caching; each resolution retries through the
    /// wait engine.
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::WindowUnavailable`] when the budget is
    /// exhausted.
    pub fn window(&self) -> UitestResult<AppWindow> {
        let root = wait_until_action_succeeds(
            || self.driver.main_window(),
            &self.config.window_policy,
        )
        .map_err(|err| UitestError::WindowUnavailable {
            message: format!(
                "no main window within {:.0?} nominal: {}",
                self.config.window_policy.nominal_timeout(),
                err.root_cause()
            ),
        })?;
        Ok(AppWindow {
            root,
            policy: self.config.locator_policy,
        })
    }

    /// Tear the session down with a known outcome.
    ///
    /// All cleanup is best-effort; failures are logged and swallowed so
    /// they never replace the test result.
    pub fn finish(mut self, outcome: TestOutcome) {
        self.teardown(outcome);
    }

    fn teardown(&mut self, outcome: TestOutcome) {
        if self.finished {
            return;
        }
        self.finished = true;

        if outcome == TestOutcome::Failed && self.config.capture_on_failure {
            match self.write_failure_screenshot() {
                Ok(Some(path)) => info!(test = %self.test_name, path = %path.display(), "failure screenshot written"),
                Ok(None) => {}
                Err(err) => warn!(test = %self.test_name, error = %err, "failure screenshot not captured"),
            }
        }

        if let Err(err) = self.driver.terminate() {
            warn!(test = %self.test_name, error = %err, "client termination failed");
        }

        if let Err(err) = self.credentials.clear() {
            warn!(test = %self.test_name, error = %err, "credential cleanup failed");
        }

        debug!(test = %self.test_name, ?outcome, "session torn down");
    }

    fn write_failure_screenshot(&self) -> UitestResult<Option<PathBuf>> {
        let Some(capture) = self.capture.as_ref() else {
            return Ok(None);
        };
        let bytes = capture.capture()?;
        std::fs::create_dir_all(&self.config.artifact_dir)?;
        let path = self
            .config
            .artifact_dir
            .join(screenshot_name(&self.test_name, self.id));
        std::fs::write(&path, bytes)?;
        Ok(Some(path))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // a session dropped without finish() never reached the end of its
        // test, which counts as a failure for artifact purposes
        self.teardown(TestOutcome::Failed);
    }
}

fn screenshot_name(test_name: &str, id: Uuid) -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let run = id.simple().to_string();
    let short = &run[..8];
    format!("screenshot_{test_name}_{timestamp}_{short}.png")
}
