//! The sign-in surface: setup prompt, credential entry, mailbox unlock.

use tracing::info;

use crate::accounts::TestAccount;
use crate::locator::{Role, Selector};
use crate::result::UitestResult;
use crate::session::AppWindow;

/// Page object for the login window
#[derive(Debug, Clone)]
pub struct LoginPage {
    window: AppWindow,
}

impl LoginPage {
    /// Bind to the current main window
    #[must_use]
    pub fn new(window: &AppWindow) -> Self {
        Self {
            window: window.clone(),
        }
    }

    /// Full sign-in flow: optional setup prompt, credentials, wait for the
    /// authorization indicator to clear, dismiss the optional setup offer.
    pub fn sign_in(&self, account: &TestAccount) -> UitestResult<&Self> {
        self.click_start_setup()?;
        self.enter_credentials(account)?;
        self.wait_for_authorization()?;
        self.dismiss_setup_prompt()?;
        Ok(self)
    }

    /// Sign-in flow for accounts protected by a second mailbox password
    pub fn sign_in_with_mailbox_password(&self, account: &TestAccount) -> UitestResult<&Self> {
        self.sign_in(account)?;
        self.enter_mailbox_password(account)?;
        self.wait_for_unlock()?;
        self.dismiss_setup_prompt()?;
        Ok(self)
    }

    /// Click the welcome screen's setup button when it is present; a fresh
    /// client shows it, an add-account flow does not
    pub fn click_start_setup(&self) -> UitestResult<&Self> {
        if let Some(button) = self
            .window
            .try_find(&Selector::role_named(Role::Button, "Start setup"))
        {
            button.click()?;
        }
        Ok(self)
    }

    /// Fill username and password and submit
    pub fn enter_credentials(&self, account: &TestAccount) -> UitestResult<&Self> {
        info!(username = %account.username, "signing in");
        self.window
            .locator(Selector::role_named(Role::Edit, "Username"))
            .type_text(&account.username)?;
        self.window
            .locator(Selector::role_named(Role::Edit, "Password"))
            .type_text(&account.password)?;
        self.window
            .locator(Selector::role_named(Role::Button, "Sign in"))
            .click()?;
        Ok(self)
    }

    /// Fill the mailbox password and unlock
    pub fn enter_mailbox_password(&self, account: &TestAccount) -> UitestResult<&Self> {
        self.window
            .locator(Selector::role_named(Role::Edit, "Mailbox password"))
            .type_text(&account.mailbox_password)?;
        self.window
            .locator(Selector::role_named(Role::Button, "Unlock"))
            .click()?;
        Ok(self)
    }

    /// Abort the sign-in flow
    pub fn cancel_sign_in(&self) -> UitestResult<&Self> {
        self.window
            .locator(Selector::role_named(Role::Button, "Cancel"))
            .click()?;
        Ok(self)
    }

    /// Authorization is finished once the "Signing in" indicator is gone
    pub fn wait_for_authorization(&self) -> UitestResult<&Self> {
        self.window
            .locator(Selector::role_named(Role::Button, "Signing in"))
            .wait_gone()?;
        Ok(self)
    }

    /// Mailbox unlock is finished once the "Unlocking" indicator is gone
    pub fn wait_for_unlock(&self) -> UitestResult<&Self> {
        self.window
            .locator(Selector::role_named(Role::Button, "Unlocking"))
            .wait_gone()?;
        Ok(self)
    }

    /// Dismiss the post-login setup offer when the client shows one
    pub fn dismiss_setup_prompt(&self) -> UitestResult<&Self> {
        if let Some(button) = self.window.try_find(&Selector::name("Setup later")) {
            button.click()?;
        }
        Ok(self)
    }
}
