//! Suite runner: one fresh session per scenario, results collection,
//! machine-readable report.

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::result::UitestResult;
use crate::session::{Session, TestOutcome};

/// A scenario body, scripted against a live session
pub type ScenarioFn = Box<dyn Fn(&Session) -> UitestResult<()> + Send + Sync>;

/// Builds a fresh session for a named test
pub type SessionFactory = dyn Fn(&str) -> UitestResult<Session> + Send + Sync;

/// A single named scenario
pub struct TestCase {
    /// Scenario name, also used in artifact file names
    pub name: String,
    run: ScenarioFn,
}

impl TestCase {
    /// Create a scenario
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&Session) -> UitestResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(run),
        }
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A named collection of scenarios, run in insertion order
#[derive(Debug, Default)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    tests: Vec<TestCase>,
}

impl TestSuite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
        }
    }

    /// Append a scenario
    #[must_use]
    pub fn with_test(mut self, test: TestCase) -> Self {
        self.tests.push(test);
        self
    }

    /// Append a scenario in place
    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Number of scenarios
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }
}

/// Outcome classification for one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    /// Scenario finished without error
    Passed,
    /// Scenario returned an error
    Failed,
    /// Scenario was not run (fail-fast stop or broken fixture)
    Skipped,
}

impl TestStatus {
    /// Whether this status counts as passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Result of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResultEntry {
    /// Scenario name
    pub name: String,
    /// Outcome
    pub status: TestStatus,
    /// Wall-clock duration
    pub duration: Duration,
    /// Error message for failed scenarios
    pub error: Option<String>,
    /// When the scenario finished
    pub completed_at: DateTime<Utc>,
}

impl TestResultEntry {
    fn finished(name: &str, status: TestStatus, duration: Duration, error: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            duration,
            error,
            completed_at: Utc::now(),
        }
    }

    fn skipped(name: &str) -> Self {
        Self::finished(name, TestStatus::Skipped, Duration::ZERO, None)
    }
}

/// Results of a whole suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResults {
    /// Suite name
    pub suite_name: String,
    /// Per-scenario results in run order
    pub results: Vec<TestResultEntry>,
    /// Total wall-clock duration
    pub duration: Duration,
}

impl SuiteResults {
    /// Whether every run scenario passed (skips do not fail a suite)
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.status != TestStatus::Failed)
    }

    /// Number of passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == TestStatus::Passed)
            .count()
    }

    /// Number of failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == TestStatus::Failed)
            .count()
    }

    /// Total number of recorded scenarios
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// The failed entries
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResultEntry> {
        self.results
            .iter()
            .filter(|r| r.status == TestStatus::Failed)
            .collect()
    }

    /// Write the results as a JSON report.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn write_json_report(&self, path: impl AsRef<Path>) -> UitestResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

/// Runs suites, one fresh session per scenario
#[derive(Debug, Default)]
pub struct TestHarness {
    /// Stop at the first failure and skip the rest
    pub fail_fast: bool,
}

impl TestHarness {
    /// Create a harness with default behavior (run everything)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable fail-fast mode
    #[must_use]
    pub const fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Run every scenario in the suite against a fresh session built by
    /// `factory`. Session teardown (failure screenshot, termination,
    /// credential cleanup) runs per scenario regardless of outcome.
    pub fn run(&self, suite: &TestSuite, factory: &SessionFactory) -> SuiteResults {
        let suite_start = Instant::now();
        let mut results = Vec::with_capacity(suite.tests.len());
        let mut stopped = false;

        for case in &suite.tests {
            if stopped {
                results.push(TestResultEntry::skipped(&case.name));
                continue;
            }

            info!(suite = %suite.name, test = %case.name, "running scenario");
            let start = Instant::now();
            let entry = match factory(&case.name) {
                Err(err) => {
                    error!(test = %case.name, error = %err, "fixture setup failed");
                    TestResultEntry::finished(
                        &case.name,
                        TestStatus::Failed,
                        start.elapsed(),
                        Some(format!("fixture setup failed: {err}")),
                    )
                }
                Ok(session) => match (case.run)(&session) {
                    Ok(()) => {
                        session.finish(TestOutcome::Passed);
                        TestResultEntry::finished(
                            &case.name,
                            TestStatus::Passed,
                            start.elapsed(),
                            None,
                        )
                    }
                    Err(err) => {
                        error!(test = %case.name, error = %err, "scenario failed");
                        session.finish(TestOutcome::Failed);
                        TestResultEntry::finished(
                            &case.name,
                            TestStatus::Failed,
                            start.elapsed(),
                            Some(err.to_string()),
                        )
                    }
                },
            };

            if entry.status == TestStatus::Failed && self.fail_fast {
                stopped = true;
            }
            results.push(entry);
        }

        SuiteResults {
            suite_name: suite.name.clone(),
            results,
            duration: suite_start.elapsed(),
        }
    }
}
