//! Polling-based waits for eventually-consistent UI state.
//!
//! The Ferrymail client exposes no push-based event channel, so every test
//! step that triggers an asynchronous state change (window appearing, a
//! button label flipping, a banner fading in) has to poll the accessibility
//! tree until the expected state becomes observable.
//!
//! Two shapes of probe exist in practice and both are kept:
//!
//! - a **boolean probe** re-queries the tree and reports whether the
//!   condition currently holds ([`wait_until_true`]);
//! - an **action** performs a lookup or interaction and fails by returning
//!   an error, e.g. when an element is not in the tree yet
//!   ([`wait_until_action_succeeds`]).
//!
//! Retries use a fixed interval with no backoff: target UI latencies in the
//! automated environment are bounded and predictable, and stable timing
//! keeps test durations comparable across runs.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::result::{UitestError, UitestResult};

/// Default attempt budget for boolean probes
pub const DEFAULT_PROBE_ATTEMPTS: u32 = 10;

/// Default interval between boolean probes (5 seconds)
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(5);

/// Default attempt budget for retried actions
pub const DEFAULT_ACTION_ATTEMPTS: u32 = 20;

/// Default interval between retried actions (2 seconds)
pub const DEFAULT_ACTION_INTERVAL: Duration = Duration::from_secs(2);

/// Retry budget for a single wait call.
///
/// A policy is created per invocation and owns nothing once the call
/// returns. `max_attempts` counts probe invocations, so the nominal upper
/// bound on blocking time is `(max_attempts - 1) * interval` plus whatever
/// the probe itself takes. A slow probe is never preempted; it overruns the
/// nominal budget instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Maximum number of probe/action invocations (at least 1)
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_PROBE_ATTEMPTS,
            interval: DEFAULT_PROBE_INTERVAL,
        }
    }
}

impl WaitPolicy {
    /// Create a policy; an attempt budget of 0 is raised to 1.
    #[must_use]
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            interval,
        }
    }

    /// Default budget for retried actions (more attempts, shorter interval).
    #[must_use]
    pub const fn for_actions() -> Self {
        Self {
            max_attempts: DEFAULT_ACTION_ATTEMPTS,
            interval: DEFAULT_ACTION_INTERVAL,
        }
    }

    /// Set the attempt budget (0 is raised to 1).
    #[must_use]
    pub const fn with_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        self
    }

    /// Set the interval between attempts.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Derive the attempt budget from a total duration at the current
    /// interval, so that the nominal blocking time covers `total`.
    ///
    /// With a zero interval the budget cannot be derived and is left
    /// unchanged.
    #[must_use]
    pub fn within(mut self, total: Duration) -> Self {
        let interval = self.interval.as_nanos();
        if interval > 0 {
            let sleeps = total.as_nanos().div_ceil(interval);
            self.max_attempts = u32::try_from(sleeps).unwrap_or(u32::MAX).saturating_add(1);
        }
        self
    }

    /// Nominal upper bound on blocking time, excluding probe latency.
    #[must_use]
    pub fn nominal_timeout(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Successful wait, for callers that care how long it took
#[derive(Debug, Clone, Copy)]
pub struct WaitOutcome {
    /// Number of probe invocations performed (the last one succeeded)
    pub attempts: u32,
    /// Total elapsed time across all attempts
    pub elapsed: Duration,
}

/// Poll a boolean probe until it returns true.
///
/// The probe is invoked at most `policy.max_attempts` times, strictly
/// sequentially, with `policy.interval` of suspension between failed
/// attempts and none after the final one. `what` names the condition in
/// the exhaustion error.
///
/// # Errors
///
/// Returns [`UitestError::ConditionNotMet`] when the budget is exhausted.
pub fn wait_until_true<F>(mut probe: F, policy: &WaitPolicy, what: &str) -> UitestResult<WaitOutcome>
where
    F: FnMut() -> bool,
{
    let budget = policy.max_attempts.max(1);
    let start = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;
        if probe() {
            debug!(what, attempt, "condition observed");
            return Ok(WaitOutcome {
                attempts: attempt,
                elapsed: start.elapsed(),
            });
        }
        if attempt >= budget {
            return Err(UitestError::ConditionNotMet {
                what: what.to_string(),
                attempts: attempt,
                elapsed: start.elapsed(),
            });
        }
        debug!(what, attempt, "condition not yet observable, retrying");
        std::thread::sleep(policy.interval);
    }
}

/// Retry a failing action until it succeeds.
///
/// Failures raised by the action are captured, never propagated inline;
/// only after the budget is exhausted is the final failure re-raised,
/// wrapped in [`UitestError::Eventually`] with the original cause chained
/// for diagnosis.
///
/// # Errors
///
/// Returns [`UitestError::Eventually`] when the budget is exhausted.
pub fn wait_until_action_succeeds<T, F>(mut action: F, policy: &WaitPolicy) -> UitestResult<T>
where
    F: FnMut() -> UitestResult<T>,
{
    let budget = policy.max_attempts.max(1);
    let start = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;
        match action() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < budget => {
                debug!(attempt, error = %err, "action failed, retrying");
                std::thread::sleep(policy.interval);
            }
            Err(err) => {
                return Err(UitestError::Eventually {
                    attempts: attempt,
                    elapsed: start.elapsed(),
                    source: Box::new(err),
                });
            }
        }
    }
}

/// Poll `probe` with the default boolean-probe budget.
///
/// # Errors
///
/// Returns [`UitestError::ConditionNotMet`] when the budget is exhausted.
pub fn eventually<F>(probe: F, what: &str) -> UitestResult<WaitOutcome>
where
    F: FnMut() -> bool,
{
    wait_until_true(probe, &WaitPolicy::default(), what)
}

/// Retry `action` with the default action budget.
///
/// # Errors
///
/// Returns [`UitestError::Eventually`] when the budget is exhausted.
pub fn eventually_action<T, F>(action: F) -> UitestResult<T>
where
    F: FnMut() -> UitestResult<T>,
{
    wait_until_action_succeeds(action, &WaitPolicy::for_actions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const FAST: WaitPolicy = WaitPolicy {
        max_attempts: 3,
        interval: Duration::ZERO,
    };

    mod wait_policy_tests {
        use super::*;

        #[test]
        fn test_default() {
            let policy = WaitPolicy::default();
            assert_eq!(policy.max_attempts, DEFAULT_PROBE_ATTEMPTS);
            assert_eq!(policy.interval, DEFAULT_PROBE_INTERVAL);
        }

        #[test]
        fn test_for_actions() {
            let policy = WaitPolicy::for_actions();
            assert_eq!(policy.max_attempts, DEFAULT_ACTION_ATTEMPTS);
            assert_eq!(policy.interval, DEFAULT_ACTION_INTERVAL);
        }

        #[test]
        fn test_new_raises_zero_budget() {
            let policy = WaitPolicy::new(0, Duration::from_millis(10));
            assert_eq!(policy.max_attempts, 1);
        }

        #[test]
        fn test_with_attempts_raises_zero_budget() {
            let policy = WaitPolicy::default().with_attempts(0);
            assert_eq!(policy.max_attempts, 1);
        }

        #[test]
        fn test_builder_chain() {
            let policy = WaitPolicy::default()
                .with_attempts(7)
                .with_interval(Duration::from_millis(250));
            assert_eq!(policy.max_attempts, 7);
            assert_eq!(policy.interval, Duration::from_millis(250));
        }

        #[test]
        fn test_within_derives_budget() {
            let policy = WaitPolicy::new(1, Duration::from_secs(2)).within(Duration::from_secs(10));
            // five sleeps of 2s cover the 10s total, plus the leading attempt
            assert_eq!(policy.max_attempts, 6);
            assert_eq!(policy.nominal_timeout(), Duration::from_secs(10));
        }

        #[test]
        fn test_within_rounds_up() {
            let policy = WaitPolicy::new(1, Duration::from_secs(3)).within(Duration::from_secs(10));
            assert_eq!(policy.max_attempts, 5);
        }

        #[test]
        fn test_within_zero_interval_is_noop() {
            let policy = WaitPolicy::new(4, Duration::ZERO).within(Duration::from_secs(10));
            assert_eq!(policy.max_attempts, 4);
        }

        #[test]
        fn test_nominal_timeout() {
            let policy = WaitPolicy::new(10, Duration::from_secs(5));
            assert_eq!(policy.nominal_timeout(), Duration::from_secs(45));
        }
    }

    mod wait_until_true_tests {
        use super::*;

        #[test]
        fn test_immediate_success_probes_once() {
            let calls = AtomicU32::new(0);
            let outcome = wait_until_true(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    true
                },
                &FAST,
                "immediate",
            )
            .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(outcome.attempts, 1);
        }

        #[test]
        fn test_always_false_probes_exactly_budget_times() {
            let calls = AtomicU32::new(0);
            let err = wait_until_true(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    false
                },
                &WaitPolicy::new(4, Duration::ZERO),
                "never",
            )
            .unwrap_err();
            assert_eq!(calls.load(Ordering::SeqCst), 4);
            assert!(matches!(
                err,
                UitestError::ConditionNotMet { attempts: 4, ref what, .. } if what == "never"
            ));
        }

        #[test]
        fn test_success_on_third_attempt() {
            // probe sequence: false, false, true
            let calls = AtomicU32::new(0);
            let outcome = wait_until_true(
                || calls.fetch_add(1, Ordering::SeqCst) >= 2,
                &FAST,
                "third time",
            )
            .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 3);
            assert_eq!(outcome.attempts, 3);
        }

        #[test]
        fn test_no_probes_beyond_success() {
            let calls = AtomicU32::new(0);
            let policy = WaitPolicy::new(10, Duration::ZERO);
            wait_until_true(
                || calls.fetch_add(1, Ordering::SeqCst) >= 1,
                &policy,
                "second time",
            )
            .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        }

        #[test]
        fn test_sequential_calls_are_independent() {
            let probe = || true;
            let first = wait_until_true(probe, &FAST, "first").unwrap();
            let second = wait_until_true(probe, &FAST, "second").unwrap();
            assert_eq!(first.attempts, 1);
            assert_eq!(second.attempts, 1);
        }

        #[test]
        fn test_zero_budget_still_probes_once() {
            let calls = AtomicU32::new(0);
            let policy = WaitPolicy {
                max_attempts: 0,
                interval: Duration::ZERO,
            };
            let err = wait_until_true(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    false
                },
                &policy,
                "clamped",
            )
            .unwrap_err();
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert!(matches!(err, UitestError::ConditionNotMet { attempts: 1, .. }));
        }
    }

    mod wait_until_action_succeeds_tests {
        use super::*;

        fn failing(message: &str) -> UitestResult<()> {
            Err(UitestError::Interaction {
                message: message.into(),
            })
        }

        #[test]
        fn test_immediate_success_returns_value() {
            let calls = AtomicU32::new(0);
            let value = wait_until_action_succeeds(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                },
                &FAST,
            )
            .unwrap();
            assert_eq!(value, 42);
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn test_always_failing_wraps_last_cause() {
            let calls = AtomicU32::new(0);
            let err = wait_until_action_succeeds(
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    failing(&format!("boom {n}"))
                },
                &WaitPolicy::new(2, Duration::ZERO),
            )
            .unwrap_err();

            assert_eq!(calls.load(Ordering::SeqCst), 2);
            match err {
                UitestError::Eventually {
                    attempts, source, ..
                } => {
                    assert_eq!(attempts, 2);
                    // the chained cause is the failure from the final attempt
                    assert!(matches!(
                        *source,
                        UitestError::Interaction { ref message } if message == "boom 2"
                    ));
                }
                other => panic!("expected Eventually, got {other:?}"),
            }
        }

        #[test]
        fn test_success_on_second_attempt() {
            let calls = AtomicU32::new(0);
            let value = wait_until_action_succeeds(
                || {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        failing("not yet")?;
                    }
                    Ok("signed in")
                },
                &FAST,
            )
            .unwrap();
            assert_eq!(value, "signed in");
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        }

        #[test]
        fn test_failures_never_escape_before_exhaustion() {
            let calls = AtomicU32::new(0);
            let result = wait_until_action_succeeds(
                || {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        failing("transient")?;
                    }
                    Ok(())
                },
                &FAST,
            );
            // two transient failures were swallowed, the third attempt won
            assert!(result.is_ok());
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }
    }

    mod convenience_tests {
        use super::*;

        #[test]
        fn test_eventually_success() {
            assert!(eventually(|| true, "always").is_ok());
        }

        #[test]
        fn test_eventually_action_success() {
            assert!(eventually_action(|| Ok(())).is_ok());
        }
    }
}
