//! The account overview: sign-out, account management, state assertions.

use tracing::info;

use crate::locator::{Role, Selector, UiElement};
use crate::result::{UitestError, UitestResult};
use crate::session::AppWindow;
use crate::wait::wait_until_true;

/// Notification shown when a free-plan account signs in
pub const FREE_PLAN_NOTICE: &str =
    "Ferrymail is exclusive to paid mail plans. Upgrade your plan to use the bridge.";

/// Inline error shown for a suspended account
pub const DISABLED_NOTICE: &str =
    "This account has been suspended due to a potential policy violation.";

/// Notification shown when adding an account that is already signed in
pub const ALREADY_SIGNED_IN_NOTICE: &str = "This account is already signed in.";

/// Page object for the signed-in account view
#[derive(Debug, Clone)]
pub struct HomePage {
    window: AppWindow,
}

impl HomePage {
    /// Bind to the current main window
    #[must_use]
    pub fn new(window: &AppWindow) -> Self {
        Self {
            window: window.clone(),
        }
    }

    /// Sign the current account out
    pub fn sign_out_account(&self) -> UitestResult<&Self> {
        info!("signing out");
        self.window
            .locator(Selector::role_named(Role::Button, "Sign out"))
            .click()?;
        Ok(self)
    }

    /// Open the sign-in flow for a signed-out account
    pub fn click_sign_in(&self) -> UitestResult<&Self> {
        self.window
            .locator(Selector::role_named(Role::Button, "Sign in"))
            .click()?;
        Ok(self)
    }

    /// Open the add-account flow
    pub fn add_new_account(&self) -> UitestResult<&Self> {
        self.window
            .locator(Selector::role_named(Role::Button, "Add account"))
            .click()?;
        Ok(self)
    }

    /// Remove the account if one is listed; safe to call as cleanup when
    /// the client is already back on the welcome screen
    pub fn remove_account(&self) -> UitestResult<&Self> {
        if let Some(button) = self
            .window
            .try_find(&Selector::role_named(Role::Button, "Remove account"))
        {
            info!("removing account");
            button.click()?;
        }
        Ok(self)
    }

    /// Turn split address mode on
    pub fn enable_split_addresses(&self) -> UitestResult<&Self> {
        self.set_split_addresses(true)
    }

    /// Turn split address mode off
    pub fn disable_split_addresses(&self) -> UitestResult<&Self> {
        self.set_split_addresses(false)
    }

    fn set_split_addresses(&self, enabled: bool) -> UitestResult<&Self> {
        let locator = self.window.locator(split_addresses_toggle());
        let toggle = locator.wait_available()?;
        if toggle.toggle_state() == Some(enabled) {
            return Ok(self);
        }
        locator.click()?;
        Ok(self)
    }
}

/// Polled assertions over the account view
#[derive(Debug, Clone)]
pub struct HomeChecks {
    window: AppWindow,
}

impl HomeChecks {
    /// Bind to the current main window
    #[must_use]
    pub fn new(window: &AppWindow) -> Self {
        Self {
            window: window.clone(),
        }
    }

    fn check_present(&self, selector: Selector, what: &str) -> UitestResult<&Self> {
        let locator = self.window.locator(selector);
        wait_until_true(|| locator.exists(), &self.window.policy(), what)?;
        Ok(self)
    }

    fn notification_text(&self) -> Option<UiElement> {
        self.window
            .try_find(&Selector::role(Role::Dialog))
            .and_then(|dialog| dialog.try_find_first(&Selector::role(Role::Text)))
    }

    /// The account is signed in once its sign-out button is offered
    pub fn logged_in(&self) -> UitestResult<&Self> {
        self.check_present(
            Selector::role_named(Role::Button, "Sign out"),
            "Sign out button available",
        )
    }

    /// The bridge reports its connection as established
    pub fn connected_state(&self) -> UitestResult<&Self> {
        self.check_present(
            Selector::role_named(Role::Text, "Connected"),
            "Connected state shown",
        )
    }

    /// The initial mailbox synchronization banner is visible
    pub fn synchronizing_bar(&self) -> UitestResult<&Self> {
        self.check_present(
            Selector::role(Role::Text).and(Selector::name_matches("^Synchronizing")?),
            "synchronizing banner shown",
        )
    }

    /// The account is listed as signed out
    pub fn account_signed_out(&self) -> UitestResult<&Self> {
        self.check_present(
            Selector::role_named(Role::Text, "Signed out"),
            "account signed out",
        )
    }

    /// The free-plan notification carries exactly `expected`
    pub fn free_account_error(&self, expected: &str) -> UitestResult<&Self> {
        wait_until_true(
            || {
                self.notification_text()
                    .is_some_and(|text| text.name() == expected)
            },
            &self.window.policy(),
            "free plan notification shown",
        )?;
        Ok(self)
    }

    /// The duplicate-account notification is displayed
    pub fn already_signed_in_notice(&self) -> UitestResult<&Self> {
        wait_until_true(
            || {
                self.notification_text()
                    .is_some_and(|text| text.name() == ALREADY_SIGNED_IN_NOTICE)
            },
            &self.window.policy(),
            "already signed in notification shown",
        )?;
        Ok(self)
    }

    /// Dismiss the duplicate-account notification
    pub fn acknowledge_already_signed_in(&self) -> UitestResult<&Self> {
        self.window
            .locator(Selector::role_named(Role::Button, "OK"))
            .click()?;
        Ok(self)
    }

    /// The wrong-credential error is displayed right now; this state is
    /// rendered synchronously with the authorization result, so it is a
    /// direct assertion rather than a polled one
    pub fn incorrect_credentials_error(&self) -> UitestResult<&Self> {
        let selector = Selector::role_named(Role::Text, "Incorrect login credentials");
        if self.window.locator(selector).exists() {
            Ok(self)
        } else {
            Err(UitestError::AssertionFailed {
                message: "incorrect credentials error not displayed".into(),
            })
        }
    }

    /// Both empty-field validation messages are displayed
    pub fn empty_credentials_errors(&self) -> UitestResult<&Self> {
        let username = self
            .window
            .locator(Selector::role_named(Role::Text, "Enter email or username"));
        let password = self
            .window
            .locator(Selector::role_named(Role::Text, "Enter password"));
        wait_until_true(
            || username.exists() && password.exists(),
            &self.window.policy(),
            "empty credential validation shown",
        )?;
        Ok(self)
    }

    /// The suspended-account error is displayed
    pub fn disabled_account_error(&self) -> UitestResult<&Self> {
        self.check_present(
            Selector::role(Role::Text)
                .and(Selector::name_contains("suspended due to a potential policy violation")),
            "suspended account error shown",
        )
    }

    /// Split address mode is off unless a test switched it on
    pub fn split_addresses_disabled(&self) -> UitestResult<&Self> {
        let locator = self.window.locator(split_addresses_toggle());
        wait_until_true(
            || {
                locator
                    .first()
                    .is_ok_and(|toggle| toggle.toggle_state() != Some(true))
            },
            &self.window.policy(),
            "split addresses off",
        )?;
        Ok(self)
    }

    /// Split address mode is on
    pub fn split_addresses_enabled(&self) -> UitestResult<&Self> {
        let locator = self.window.locator(split_addresses_toggle());
        wait_until_true(
            || {
                locator
                    .first()
                    .is_ok_and(|toggle| toggle.toggle_state() == Some(true))
            },
            &self.window.policy(),
            "split addresses on",
        )?;
        Ok(self)
    }
}

fn split_addresses_toggle() -> Selector {
    Selector::role_named(Role::CheckBox, "Split addresses toggle")
}
