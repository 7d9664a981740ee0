//! End-to-end UI test harness for the Ferrymail desktop bridge client.
//!
//! The client is driven through its accessibility tree: find an element,
//! interact, then poll until the expected state becomes observable. The
//! layers, bottom up:
//!
//! - [`wait`] — the eventual-consistency core: fixed-interval,
//!   attempt-budgeted polling for boolean probes and raising actions
//! - [`locator`] — selector vocabulary and auto-waiting element
//!   resolution over an abstract [`locator::ElementBackend`]
//! - [`session`] — per-test fixture: launch, window resolution,
//!   guaranteed teardown with failure screenshots
//! - [`pages`] — page objects for the login and account surfaces
//! - [`harness`] — suite runner and JSON reporting
//! - [`mock`] — simulated client so the whole suite runs headless
//!
//! The end-to-end scenarios live in `tests/`.

#![warn(missing_docs)]

/// Test account definitions
pub mod accounts;
/// Suite runner and reporting
pub mod harness;
/// Element selectors and resolution
pub mod locator;
/// Tracing bootstrap
pub mod logging;
/// Simulated client backend
pub mod mock;
/// Page objects
pub mod pages;
/// Error and result types
pub mod result;
/// Per-test session fixture
pub mod session;
/// Polling wait engine
pub mod wait;

pub use accounts::{AccountCatalog, TestAccount};
pub use harness::{SuiteResults, TestCase, TestHarness, TestStatus, TestSuite};
pub use locator::{ElementBackend, Locator, Role, Selector, UiElement};
pub use result::{UitestError, UitestResult};
pub use session::{
    AppDriver, AppWindow, CredentialStore, ScreenCapture, Session, SessionConfig, TestOutcome,
};
pub use wait::{
    eventually, eventually_action, wait_until_action_succeeds, wait_until_true, WaitOutcome,
    WaitPolicy,
};
