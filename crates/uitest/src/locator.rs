//! Element lookup over an abstract accessibility tree.
//!
//! The harness never talks to a concrete UI-automation binding. Concrete
//! bindings (and the in-memory [`crate::mock`] backend) implement
//! [`ElementBackend`]; everything above works in terms of [`UiElement`]
//! handles and [`Selector`] predicates.
//!
//! [`Locator`] is the auto-waiting layer: element resolution against a live
//! tree is late-bound and racy, so lookups retry through the wait engine.
//! Both failure shapes of the underlying bindings are preserved: queries
//! that report absence as a boolean ([`Locator::exists`],
//! [`Locator::wait_gone`]) and queries that report absence by raising
//! ([`Locator::wait_available`], [`Locator::click`]).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::result::{UitestError, UitestResult};
use crate::wait::{wait_until_action_succeeds, wait_until_true, WaitPolicy};

/// Default retry budget for element resolution: 20 attempts at 500ms,
/// a nominal ten seconds per lookup.
pub const DEFAULT_LOCATOR_POLICY: WaitPolicy = WaitPolicy {
    max_attempts: 20,
    interval: Duration::from_millis(500),
};

// =============================================================================
// SELECTORS
// =============================================================================

/// Control types the suite queries by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Top-level application window
    Window,
    /// Generic content pane
    Pane,
    /// Labelled grouping container
    Group,
    /// Modal or notification dialog
    Dialog,
    /// Push button
    Button,
    /// Editable text input
    Edit,
    /// Static text
    Text,
    /// Two-state toggle
    CheckBox,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Window => "window",
            Self::Pane => "pane",
            Self::Group => "group",
            Self::Dialog => "dialog",
            Self::Button => "button",
            Self::Edit => "edit",
            Self::Text => "text",
            Self::CheckBox => "checkbox",
        };
        write!(f, "{name}")
    }
}

/// A compiled element-name pattern
#[derive(Debug, Clone)]
pub struct NamePattern {
    pattern: String,
    regex: Regex,
}

impl NamePattern {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::InvalidPattern`] if the pattern is not a
    /// valid regular expression.
    pub fn new(pattern: impl Into<String>) -> UitestResult<Self> {
        let pattern = pattern.into();
        let regex = Regex::new(&pattern)?;
        Ok(Self { pattern, regex })
    }

    /// Check whether a name matches.
    #[must_use]
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Predicate for locating elements in the accessibility tree
#[derive(Debug, Clone)]
pub enum Selector {
    /// Match by control type
    Role(Role),
    /// Match by exact accessible name
    Name(String),
    /// Match when the accessible name contains a substring
    NameContains(String),
    /// Match the accessible name against a compiled pattern
    NameMatches(NamePattern),
    /// Both predicates must match the same element
    And(Box<Selector>, Box<Selector>),
}

impl Selector {
    /// Select by control type
    #[must_use]
    pub const fn role(role: Role) -> Self {
        Self::Role(role)
    }

    /// Select by exact accessible name
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Select by name substring
    #[must_use]
    pub fn name_contains(fragment: impl Into<String>) -> Self {
        Self::NameContains(fragment.into())
    }

    /// Select by name pattern.
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::InvalidPattern`] for an invalid pattern.
    pub fn name_matches(pattern: impl Into<String>) -> UitestResult<Self> {
        Ok(Self::NameMatches(NamePattern::new(pattern)?))
    }

    /// Select by control type and exact name together
    #[must_use]
    pub fn role_named(role: Role, name: impl Into<String>) -> Self {
        Self::role(role).and(Self::name(name))
    }

    /// Require an additional predicate on the same element
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Evaluate the predicate against an element snapshot
    #[must_use]
    pub fn matches(&self, role: Role, name: &str) -> bool {
        match self {
            Self::Role(r) => *r == role,
            Self::Name(n) => n == name,
            Self::NameContains(fragment) => name.contains(fragment.as_str()),
            Self::NameMatches(pattern) => pattern.is_match(name),
            Self::And(a, b) => a.matches(role, name) && b.matches(role, name),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role(role) => write!(f, "{role}"),
            Self::Name(name) => write!(f, "'{name}'"),
            Self::NameContains(fragment) => write!(f, "name containing '{fragment}'"),
            Self::NameMatches(pattern) => write!(f, "name matching /{}/", pattern.pattern),
            Self::And(a, b) => write!(f, "{a} {b}"),
        }
    }
}

// =============================================================================
// ELEMENT HANDLES
// =============================================================================

/// What a concrete accessibility binding implements.
///
/// All methods observe or drive live UI state; interaction verbs fail when
/// the element has gone stale between lookup and use, which callers absorb
/// by retrying through the wait engine.
pub trait ElementBackend: Send + Sync {
    /// Control type of this element
    fn role(&self) -> Role;

    /// Accessible name, re-read from the live tree
    fn name(&self) -> String;

    /// Whether the element is still attached and visible
    fn is_available(&self) -> bool;

    /// Click the element
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::Interaction`] if the element cannot be
    /// clicked (stale, hidden, disabled).
    fn click(&self) -> UitestResult<()>;

    /// Replace the element's text content
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::Interaction`] if the element is not editable.
    fn set_text(&self, text: &str) -> UitestResult<()>;

    /// Toggle state for checkbox-like elements; `None` when indeterminate
    /// or not a toggle
    fn toggle_state(&self) -> Option<bool>;

    /// All descendants matching the selector, in tree order
    fn find_all(&self, selector: &Selector) -> Vec<UiElement>;
}

/// A cheap clonable handle to one element in the accessibility tree
#[derive(Clone)]
pub struct UiElement(Arc<dyn ElementBackend>);

impl UiElement {
    /// Wrap a backend handle
    #[must_use]
    pub fn new(backend: Arc<dyn ElementBackend>) -> Self {
        Self(backend)
    }

    /// Control type
    #[must_use]
    pub fn role(&self) -> Role {
        self.0.role()
    }

    /// Accessible name, re-read from the live tree
    #[must_use]
    pub fn name(&self) -> String {
        self.0.name()
    }

    /// Whether the element is still attached and visible
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.0.is_available()
    }

    /// Click the element
    ///
    /// # Errors
    ///
    /// See [`ElementBackend::click`].
    pub fn click(&self) -> UitestResult<()> {
        self.0.click()
    }

    /// Replace the element's text content
    ///
    /// # Errors
    ///
    /// See [`ElementBackend::set_text`].
    pub fn set_text(&self, text: &str) -> UitestResult<()> {
        self.0.set_text(text)
    }

    /// Toggle state for checkbox-like elements
    #[must_use]
    pub fn toggle_state(&self) -> Option<bool> {
        self.0.toggle_state()
    }

    /// All matching descendants, in tree order
    #[must_use]
    pub fn find_all(&self, selector: &Selector) -> Vec<UiElement> {
        self.0.find_all(selector)
    }

    /// First matching descendant, if any
    #[must_use]
    pub fn try_find_first(&self, selector: &Selector) -> Option<UiElement> {
        self.0.find_all(selector).into_iter().next()
    }

    /// First matching descendant
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::ElementNotFound`] when nothing matches.
    pub fn find_first(&self, selector: &Selector) -> UitestResult<UiElement> {
        self.try_find_first(selector)
            .ok_or_else(|| UitestError::ElementNotFound {
                selector: selector.to_string(),
            })
    }
}

impl fmt::Debug for UiElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiElement")
            .field("role", &self.role())
            .field("name", &self.name())
            .field("available", &self.is_available())
            .finish()
    }
}

// =============================================================================
// AUTO-WAITING LOCATOR
// =============================================================================

/// An auto-waiting element resolver bound to a root element.
///
/// Lookups re-query the tree beneath `root` on every attempt, so a locator
/// stays valid across UI rebuilds as long as the root itself survives.
#[derive(Debug, Clone)]
pub struct Locator {
    root: UiElement,
    selector: Selector,
    policy: WaitPolicy,
}

impl Locator {
    /// Create a locator beneath `root` with the default retry budget
    #[must_use]
    pub fn new(root: UiElement, selector: Selector) -> Self {
        Self {
            root,
            selector,
            policy: DEFAULT_LOCATOR_POLICY,
        }
    }

    /// Override the retry budget for this locator
    #[must_use]
    pub const fn with_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve the first match right now, without waiting
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::ElementNotFound`] when nothing matches.
    pub fn first(&self) -> UitestResult<UiElement> {
        self.root.find_first(&self.selector)
    }

    /// All current matches, without waiting
    #[must_use]
    pub fn all(&self) -> Vec<UiElement> {
        self.root.find_all(&self.selector)
    }

    /// Whether a matching, available element currently exists.
    ///
    /// This is the boolean probe shape; absence is not an error.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.all().iter().any(UiElement::is_available)
    }

    /// Wait until a matching element is present and available.
    ///
    /// This is the raising shape: each attempt resolves afresh and fails
    /// with [`UitestError::ElementNotFound`] until the element shows up.
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::Eventually`] wrapping the final lookup
    /// failure when the budget is exhausted.
    pub fn wait_available(&self) -> UitestResult<UiElement> {
        debug!(selector = %self.selector, "waiting for element");
        wait_until_action_succeeds(
            || {
                let element = self.first()?;
                if element.is_available() {
                    Ok(element)
                } else {
                    Err(UitestError::ElementNotFound {
                        selector: self.selector.to_string(),
                    })
                }
            },
            &self.policy,
        )
    }

    /// Wait until no matching element is available any more.
    ///
    /// Used for transient indicators ("Signing in", "Unlocking") whose
    /// disappearance signals that an asynchronous step finished.
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::ConditionNotMet`] when the element is still
    /// there after the budget is exhausted.
    pub fn wait_gone(&self) -> UitestResult<()> {
        debug!(selector = %self.selector, "waiting for element to go away");
        wait_until_true(
            || !self.exists(),
            &self.policy,
            &format!("{} gone", self.selector),
        )?;
        Ok(())
    }

    /// Resolve and click, retrying the whole lookup-then-click as one
    /// action so a stale handle is simply re-resolved.
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::Eventually`] when the budget is exhausted.
    pub fn click(&self) -> UitestResult<()> {
        debug!(selector = %self.selector, "click");
        wait_until_action_succeeds(
            || {
                let element = self.first()?;
                element.click()
            },
            &self.policy,
        )
    }

    /// Resolve and replace text, with the same retry discipline as
    /// [`Locator::click`].
    ///
    /// # Errors
    ///
    /// Returns [`UitestError::Eventually`] when the budget is exhausted.
    pub fn type_text(&self, text: &str) -> UitestResult<()> {
        debug!(selector = %self.selector, "type text");
        wait_until_action_succeeds(
            || {
                let element = self.first()?;
                element.set_text(text)
            },
            &self.policy,
        )
    }

    /// The selector this locator resolves
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }
}
