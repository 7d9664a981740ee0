//! Result and error types for the Ferrymail UI test harness.

use std::time::Duration;
use thiserror::Error;

/// Result type for harness operations
pub type UitestResult<T> = Result<T, UitestError>;

/// Errors that can occur while driving the Ferrymail client
#[derive(Debug, Error)]
pub enum UitestError {
    /// A boolean probe never returned true within its attempt budget
    #[error("condition '{}' not met after {} attempt(s) ({:.2}s)", .what, .attempts, .elapsed.as_secs_f64())]
    ConditionNotMet {
        /// What was being waited for
        what: String,
        /// Number of probe invocations performed
        attempts: u32,
        /// Total elapsed time across all attempts
        elapsed: Duration,
    },

    /// A retried action kept failing; the last cause is chained
    #[error("action still failing after {} attempt(s) ({:.2}s)", .attempts, .elapsed.as_secs_f64())]
    Eventually {
        /// Number of action invocations performed
        attempts: u32,
        /// Total elapsed time across all attempts
        elapsed: Duration,
        /// The failure observed on the final attempt
        #[source]
        source: Box<UitestError>,
    },

    /// No element matched a selector
    #[error("no element matching {selector}")]
    ElementNotFound {
        /// Selector description
        selector: String,
    },

    /// An element was found but could not be interacted with
    #[error("interaction failed: {message}")]
    Interaction {
        /// Error message
        message: String,
    },

    /// The application main window could not be resolved
    #[error("main window unavailable: {message}")]
    WindowUnavailable {
        /// Error message
        message: String,
    },

    /// Session lifecycle error (launch, terminate, credential cleanup)
    #[error("session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Screenshot capture failed
    #[error("capture failed: {message}")]
    Capture {
        /// Error message
        message: String,
    },

    /// A non-polled assertion failed
    #[error("assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Invalid element-name pattern
    #[error("invalid name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UitestError {
    /// Walk the `source` chain to the innermost cause.
    ///
    /// For [`UitestError::Eventually`] this is the failure observed on the
    /// final attempt, which is usually the interesting one for diagnosis.
    #[must_use]
    pub fn root_cause(&self) -> &UitestError {
        match self {
            Self::Eventually { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_not_met_display() {
        let err = UitestError::ConditionNotMet {
            what: "Sign out button available".into(),
            attempts: 10,
            elapsed: Duration::from_secs(45),
        };
        let display = format!("{err}");
        assert!(display.contains("Sign out button available"));
        assert!(display.contains("10 attempt(s)"));
        assert!(display.contains("45.00s"));
    }

    #[test]
    fn test_eventually_chains_cause() {
        let err = UitestError::Eventually {
            attempts: 2,
            elapsed: Duration::ZERO,
            source: Box::new(UitestError::ElementNotFound {
                selector: "button 'Unlock'".into(),
            }),
        };
        let source = std::error::Error::source(&err).expect("cause is chained");
        assert!(source.to_string().contains("button 'Unlock'"));
    }

    #[test]
    fn test_root_cause_unwraps_nesting() {
        let inner = UitestError::Interaction {
            message: "element vanished".into(),
        };
        let err = UitestError::Eventually {
            attempts: 3,
            elapsed: Duration::ZERO,
            source: Box::new(UitestError::Eventually {
                attempts: 1,
                elapsed: Duration::ZERO,
                source: Box::new(inner),
            }),
        };
        assert!(matches!(
            err.root_cause(),
            UitestError::Interaction { message } if message == "element vanished"
        ));
    }
}
