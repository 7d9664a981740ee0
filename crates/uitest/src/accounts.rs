//! Test account definitions for the Ferrymail scenarios.
//!
//! Accounts can be supplied as a JSON document (path taken from the
//! `FERRYMAIL_TEST_ACCOUNTS` environment variable) so CI can point the
//! suite at seeded environment users; without one the built-in defaults
//! are used.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Environment variable naming the accounts JSON file
pub const ACCOUNTS_FILE_ENV: &str = "FERRYMAIL_TEST_ACCOUNTS";

use crate::result::UitestResult;

/// Credentials for one test user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestAccount {
    /// Login username or email
    pub username: String,
    /// Login password
    pub password: String,
    /// Secondary mailbox password, empty unless the account uses one
    #[serde(default)]
    pub mailbox_password: String,
}

impl TestAccount {
    /// Create an account without a mailbox password
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            mailbox_password: String::new(),
        }
    }

    /// Create an account with a mailbox password
    #[must_use]
    pub fn with_mailbox_password(mut self, mailbox_password: impl Into<String>) -> Self {
        self.mailbox_password = mailbox_password.into();
        self
    }
}

/// The named account roles the scenarios sign in with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCatalog {
    /// Paid-plan account, the default happy path
    pub paid: TestAccount,
    /// Free-plan account, rejected by the bridge
    pub free: TestAccount,
    /// Paid account with an alias address attached
    pub alias: TestAccount,
    /// Account protected by a second mailbox password
    pub mailbox: TestAccount,
    /// Suspended account
    pub disabled: TestAccount,
}

impl AccountCatalog {
    /// Built-in defaults matching the seeded test environment
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            paid: TestAccount::new("paid.user@ferrymail.test", "paid-pass-1"),
            free: TestAccount::new("free.user@ferrymail.test", "free-pass-1"),
            alias: TestAccount::new("alias.user@ferrymail.test", "alias-pass-1"),
            mailbox: TestAccount::new("mailbox.user@ferrymail.test", "mailbox-pass-1")
                .with_mailbox_password("second-secret"),
            disabled: TestAccount::new("disabled.user@ferrymail.test", "disabled-pass-1"),
        }
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> UitestResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Resolve the catalog: the `FERRYMAIL_TEST_ACCOUNTS` file when set,
    /// built-in defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment points at an unreadable or
    /// invalid file.
    pub fn resolve() -> UitestResult<Self> {
        match std::env::var(ACCOUNTS_FILE_ENV) {
            Ok(path) if !path.is_empty() => Self::from_file(path),
            _ => Ok(Self::builtin()),
        }
    }

    /// An account that exists nowhere, for wrong-credential scenarios
    #[must_use]
    pub fn incorrect() -> TestAccount {
        TestAccount::new("no.such.user@ferrymail.test", "wrong-pass")
    }

    /// Empty username and password, for validation scenarios
    #[must_use]
    pub fn empty() -> TestAccount {
        TestAccount::new("", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_roles_are_distinct() {
        let catalog = AccountCatalog::builtin();
        assert_ne!(catalog.paid.username, catalog.free.username);
        assert_ne!(catalog.paid.username, catalog.disabled.username);
        assert!(!catalog.mailbox.mailbox_password.is_empty());
        assert!(catalog.paid.mailbox_password.is_empty());
    }

    #[test]
    fn test_roundtrip_json() {
        let catalog = AccountCatalog::builtin();
        let raw = serde_json::to_string(&catalog).unwrap();
        let parsed: AccountCatalog = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn test_mailbox_password_defaults_to_empty() {
        let parsed: TestAccount =
            serde_json::from_str(r#"{"username": "u@x.test", "password": "p"}"#).unwrap();
        assert_eq!(parsed.mailbox_password, "");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let catalog = AccountCatalog::builtin();
        std::fs::write(&path, serde_json::to_string(&catalog).unwrap()).unwrap();
        assert_eq!(AccountCatalog::from_file(&path).unwrap(), catalog);
    }

    #[test]
    fn test_from_missing_file_is_error() {
        assert!(AccountCatalog::from_file("/nonexistent/accounts.json").is_err());
    }

    #[test]
    fn test_resolve_defaults_to_builtin() {
        // the suite never sets the env override itself
        if std::env::var(ACCOUNTS_FILE_ENV).is_err() {
            assert_eq!(AccountCatalog::resolve().unwrap(), AccountCatalog::builtin());
        }
    }
}
