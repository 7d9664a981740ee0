//! In-memory backend standing in for the real desktop client.
//!
//! The suite never depends on a concrete accessibility binding, so it can
//! run headless against this module: [`MockUi`] is a mutable element tree
//! implementing [`ElementBackend`], and [`MockApp`] drives it with a
//! deterministic model of the Ferrymail login/account state machine.
//!
//! Asynchronous UI latency is simulated by counting polls: transient
//! states ("Signing in", "Unlocking", the synchronizing banner) persist
//! for a configured number of tree queries before resolving, which is
//! exactly what the wait engine has to absorb against the real client.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::accounts::{AccountCatalog, TestAccount};
use crate::locator::{ElementBackend, Role, Selector, UiElement};
use crate::pages::{ALREADY_SIGNED_IN_NOTICE, DISABLED_NOTICE, FREE_PLAN_NOTICE};
use crate::result::{UitestError, UitestResult};
use crate::session::{AppDriver, CredentialStore, ScreenCapture};

/// Identifier of one node in the mock tree
pub type NodeId = u64;

// =============================================================================
// ELEMENT TREE
// =============================================================================

#[derive(Debug, Clone)]
struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    role: Role,
    name: String,
    text: String,
    visible: bool,
    toggled: Option<bool>,
    clicks: u32,
}

#[derive(Debug)]
enum PendingOp {
    Add {
        role: Role,
        name: String,
        due: u64,
    },
    Remove {
        id: NodeId,
        due: u64,
    },
}

#[derive(Debug, Default)]
struct TreeState {
    nodes: Vec<Node>,
    next_id: NodeId,
    polls: u64,
    pending: Vec<PendingOp>,
    model: Option<AppModel>,
}

impl TreeState {
    fn new() -> Self {
        Self {
            nodes: vec![Node {
                id: 0,
                parent: None,
                role: Role::Window,
                name: "Ferrymail".into(),
                text: String::new(),
                visible: true,
                toggled: None,
                clicks: 0,
            }],
            next_id: 1,
            polls: 0,
            pending: Vec::new(),
            model: None,
        }
    }

    fn alloc(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    fn text_by_name(&self, name: &str) -> String {
        self.nodes
            .iter()
            .find(|n| n.name == name)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    fn apply_pending(&mut self) {
        let ops = std::mem::take(&mut self.pending);
        let (ready, waiting): (Vec<PendingOp>, Vec<PendingOp>) =
            ops.into_iter().partition(|op| match op {
                PendingOp::Add { due, .. } | PendingOp::Remove { due, .. } => *due <= self.polls,
            });
        self.pending = waiting;
        for op in ready {
            match op {
                PendingOp::Add { role, name, .. } => {
                    let id = self.alloc();
                    self.nodes.push(Node {
                        id,
                        parent: Some(0),
                        role,
                        name,
                        text: String::new(),
                        visible: true,
                        toggled: None,
                        clicks: 0,
                    });
                }
                PendingOp::Remove { id, .. } => self.remove_subtree(id),
            }
        }
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let doomed: Vec<NodeId> = std::iter::once(id)
            .chain(self.descendants(id))
            .collect();
        self.nodes.retain(|n| !doomed.contains(&n.id));
    }

    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut frontier = vec![id];
        while let Some(current) = frontier.pop() {
            for node in &self.nodes {
                if node.parent == Some(current) {
                    result.push(node.id);
                    frontier.push(node.id);
                }
            }
        }
        result
    }

    /// One accessibility-tree query: advances simulated time, then collects
    /// the matching descendants of `from` in tree order.
    fn poll(&mut self, from: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.apply_pending();
        if let Some(model) = self.model.as_mut() {
            model.tick();
        }
        self.rebuild();
        self.polls += 1;

        let mut scope: Vec<NodeId> = self.descendants(from);
        scope.sort_by_key(|id| self.nodes.iter().position(|n| n.id == *id));
        scope
            .into_iter()
            .filter(|id| {
                self.node(*id)
                    .is_some_and(|n| selector.matches(n.role, &n.name))
            })
            .collect()
    }

    fn click(&mut self, id: NodeId) -> UitestResult<()> {
        let Some(node) = self.node(id) else {
            return Err(UitestError::Interaction {
                message: "element is no longer in the tree".into(),
            });
        };
        if !node.visible {
            return Err(UitestError::Interaction {
                message: format!("'{}' is not visible", node.name),
            });
        }
        let name = node.name.clone();
        if let Some(node) = self.node_mut(id) {
            node.clicks += 1;
        }

        if self.model.is_some() {
            let inputs = Inputs {
                username: self.text_by_name("Username"),
                password: self.text_by_name("Password"),
                mailbox_password: self.text_by_name("Mailbox password"),
            };
            if let Some(model) = self.model.as_mut() {
                model.on_click(&name, &inputs);
            }
            self.rebuild();
        }
        Ok(())
    }

    fn set_text(&mut self, id: NodeId, text: &str) -> UitestResult<()> {
        let Some(node) = self.node_mut(id) else {
            return Err(UitestError::Interaction {
                message: "element is no longer in the tree".into(),
            });
        };
        if node.role != Role::Edit {
            return Err(UitestError::Interaction {
                message: format!("'{}' is not editable", node.name),
            });
        }
        if !node.visible {
            return Err(UitestError::Interaction {
                message: format!("'{}' is not visible", node.name),
            });
        }
        node.text = text.to_string();
        Ok(())
    }

    /// Replace the rendered children of the root with the model's current
    /// screen, keeping ids (and typed text) for elements that survive.
    fn rebuild(&mut self) {
        let Some(model) = self.model.as_ref() else {
            return;
        };
        let specs = model.render();

        let old: Vec<Node> = self.nodes.split_off(1);
        let mut consumed = vec![false; old.len()];
        let mut new_ids: Vec<NodeId> = Vec::with_capacity(specs.len());

        for spec in &specs {
            let reused = old.iter().enumerate().find(|(i, n)| {
                !consumed[*i] && n.role == spec.role && n.name == spec.name
            });
            let parent = Some(
                spec.parent
                    .and_then(|idx| new_ids.get(idx).copied())
                    .unwrap_or(0),
            );
            match reused {
                Some((i, n)) => {
                    consumed[i] = true;
                    let mut node = n.clone();
                    node.parent = parent;
                    node.toggled = spec.toggled;
                    node.visible = true;
                    new_ids.push(node.id);
                    self.nodes.push(node);
                }
                None => {
                    let id = self.alloc();
                    self.nodes.push(Node {
                        id,
                        parent,
                        role: spec.role,
                        name: spec.name.clone(),
                        text: String::new(),
                        visible: true,
                        toggled: spec.toggled,
                        clicks: 0,
                    });
                    new_ids.push(id);
                }
            }
        }
    }
}

/// Shared handle to the mock element tree
#[derive(Clone, Debug)]
pub struct MockUi {
    state: Arc<Mutex<TreeState>>,
}

impl Default for MockUi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUi {
    /// Create an empty tree with a Ferrymail window root
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TreeState::new())),
        }
    }

    /// Handle to the window root
    #[must_use]
    pub fn root(&self) -> UiElement {
        self.element(0, Role::Window)
    }

    fn element(&self, id: NodeId, role: Role) -> UiElement {
        UiElement::new(Arc::new(MockElement {
            id,
            role,
            state: Arc::clone(&self.state),
        }))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TreeState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Add a visible child of the root
    pub fn add(&self, role: Role, name: impl Into<String>) -> NodeId {
        let mut state = self.lock();
        let id = state.alloc();
        state.nodes.push(Node {
            id,
            parent: Some(0),
            role,
            name: name.into(),
            text: String::new(),
            visible: true,
            toggled: None,
            clicks: 0,
        });
        id
    }

    /// Add an element that only becomes part of the tree after the tree
    /// has been queried `polls` more times
    pub fn add_after_polls(&self, role: Role, name: impl Into<String>, polls: u64) {
        let mut state = self.lock();
        let due = state.polls + polls;
        state.pending.push(PendingOp::Add {
            role,
            name: name.into(),
            due,
        });
    }

    /// Remove an element (and its subtree) after `polls` more queries
    pub fn remove_after_polls(&self, id: NodeId, polls: u64) {
        let mut state = self.lock();
        let due = state.polls + polls;
        state.pending.push(PendingOp::Remove { id, due });
    }

    /// Show or hide an element
    pub fn set_visible(&self, id: NodeId, visible: bool) {
        if let Some(node) = self.lock().node_mut(id) {
            node.visible = visible;
        }
    }

    /// Total clicks received by elements with this name
    #[must_use]
    pub fn clicks(&self, name: &str) -> u32 {
        self.lock()
            .nodes
            .iter()
            .filter(|n| n.name == name)
            .map(|n| n.clicks)
            .sum()
    }

    /// Current text content of the first element with this name
    #[must_use]
    pub fn text_of(&self, name: &str) -> String {
        self.lock().text_by_name(name)
    }

    fn install_model(&self, model: AppModel) {
        let mut state = self.lock();
        state.model = Some(model);
        state.rebuild();
    }

    fn clear(&self) {
        let mut state = self.lock();
        state.model = None;
        state.nodes.truncate(1);
        state.pending.clear();
    }
}

struct MockElement {
    id: NodeId,
    role: Role,
    state: Arc<Mutex<TreeState>>,
}

impl MockElement {
    fn lock(&self) -> std::sync::MutexGuard<'_, TreeState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ElementBackend for MockElement {
    fn role(&self) -> Role {
        self.role
    }

    fn name(&self) -> String {
        self.lock()
            .node(self.id)
            .map(|n| n.name.clone())
            .unwrap_or_default()
    }

    fn is_available(&self) -> bool {
        self.lock().node(self.id).is_some_and(|n| n.visible)
    }

    fn click(&self) -> UitestResult<()> {
        self.lock().click(self.id)
    }

    fn set_text(&self, text: &str) -> UitestResult<()> {
        self.lock().set_text(self.id, text)
    }

    fn toggle_state(&self) -> Option<bool> {
        self.lock().node(self.id).and_then(|n| n.toggled)
    }

    fn find_all(&self, selector: &Selector) -> Vec<UiElement> {
        let matches = self.lock().poll(self.id, selector);
        let ui = MockUi {
            state: Arc::clone(&self.state),
        };
        matches
            .into_iter()
            .filter_map(|id| {
                let role = ui.lock().node(id).map(|n| n.role);
                role.map(|role| ui.element(id, role))
            })
            .collect()
    }
}

// =============================================================================
// CLIENT MODEL
// =============================================================================

#[derive(Debug, Clone)]
struct Inputs {
    username: String,
    password: String,
    mailbox_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccountKind {
    Paid,
    Alias,
    Free,
    Disabled,
    MailboxSecured,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Screen {
    Welcome,
    Credentials,
    SigningIn { remaining: u32 },
    MailboxUnlock { username: String },
    Unlocking { remaining: u32, username: String },
    SetupPrompt { username: String },
    Home,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notice {
    None,
    Empty {
        username_missing: bool,
        password_missing: bool,
    },
    Incorrect,
    Free,
    Disabled,
    AlreadySignedIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    Setup { username: String },
    Unlock { username: String },
    Reject(Notice),
}

/// Poll-latency knobs for the simulated client
#[derive(Debug, Clone, Copy)]
struct Latencies {
    signing_in: u32,
    unlocking: u32,
    synchronizing: u32,
}

impl Default for Latencies {
    fn default() -> Self {
        Self {
            signing_in: 2,
            unlocking: 2,
            synchronizing: 30,
        }
    }
}

#[derive(Debug)]
struct AppModel {
    catalog: AccountCatalog,
    latencies: Latencies,
    screen: Screen,
    notice: Notice,
    pending: Option<Resolution>,
    signed_in: Option<String>,
    signed_out: bool,
    split_addresses: bool,
    sync_remaining: u32,
}

struct Spec {
    role: Role,
    name: String,
    toggled: Option<bool>,
    parent: Option<usize>,
}

impl Spec {
    fn new(role: Role, name: &str) -> Self {
        Self {
            role,
            name: name.to_string(),
            toggled: None,
            parent: None,
        }
    }

    fn child_of(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    fn toggled(mut self, state: bool) -> Self {
        self.toggled = Some(state);
        self
    }
}

impl AppModel {
    fn new(catalog: AccountCatalog, latencies: Latencies) -> Self {
        Self {
            catalog,
            latencies,
            screen: Screen::Welcome,
            notice: Notice::None,
            pending: None,
            signed_in: None,
            signed_out: false,
            split_addresses: false,
            sync_remaining: 0,
        }
    }

    fn classify(&self, username: &str, password: &str) -> Option<AccountKind> {
        let known: [(&TestAccount, AccountKind); 5] = [
            (&self.catalog.paid, AccountKind::Paid),
            (&self.catalog.alias, AccountKind::Alias),
            (&self.catalog.free, AccountKind::Free),
            (&self.catalog.mailbox, AccountKind::MailboxSecured),
            (&self.catalog.disabled, AccountKind::Disabled),
        ];
        known
            .into_iter()
            .find(|(account, _)| account.username == username && account.password == password)
            .map(|(_, kind)| kind)
    }

    fn already_signed_in(&self, username: &str) -> bool {
        !self.signed_out && self.signed_in.as_deref() == Some(username)
    }

    fn submit(&mut self, inputs: &Inputs) {
        let username_missing = inputs.username.is_empty();
        let password_missing = inputs.password.is_empty();
        if username_missing || password_missing {
            // validation errors show inline without an authorization round-trip
            self.notice = Notice::Empty {
                username_missing,
                password_missing,
            };
            return;
        }

        let resolution = match self.classify(&inputs.username, &inputs.password) {
            None => Resolution::Reject(Notice::Incorrect),
            Some(AccountKind::Free) => Resolution::Reject(Notice::Free),
            Some(AccountKind::Disabled) => Resolution::Reject(Notice::Disabled),
            Some(_) if self.already_signed_in(&inputs.username) => {
                Resolution::Reject(Notice::AlreadySignedIn)
            }
            Some(AccountKind::MailboxSecured) => Resolution::Unlock {
                username: inputs.username.clone(),
            },
            Some(AccountKind::Paid | AccountKind::Alias) => Resolution::Setup {
                username: inputs.username.clone(),
            },
        };
        self.notice = Notice::None;
        self.pending = Some(resolution);
        self.screen = Screen::SigningIn {
            remaining: self.latencies.signing_in,
        };
    }

    fn cancel(&mut self) {
        self.notice = Notice::None;
        self.pending = None;
        self.screen = if self.signed_in.is_some() {
            Screen::Home
        } else {
            Screen::Welcome
        };
    }

    fn complete_sign_in(&mut self, username: String) {
        self.signed_in = Some(username);
        self.signed_out = false;
        self.notice = Notice::None;
        self.sync_remaining = self.latencies.synchronizing;
        self.screen = Screen::Home;
    }

    fn on_click(&mut self, name: &str, inputs: &Inputs) {
        let screen = self.screen.clone();
        match (&screen, name) {
            (Screen::Welcome, "Start setup") => {
                self.screen = Screen::Credentials;
                self.notice = Notice::None;
            }
            (Screen::Credentials, "Sign in") => self.submit(inputs),
            (Screen::Credentials, "OK") => {
                if self.notice == Notice::AlreadySignedIn {
                    self.notice = Notice::None;
                }
            }
            (
                Screen::Credentials
                | Screen::SigningIn { .. }
                | Screen::MailboxUnlock { .. },
                "Cancel",
            ) => self.cancel(),
            (Screen::MailboxUnlock { username }, "Unlock") => {
                if inputs.mailbox_password == self.catalog.mailbox.mailbox_password {
                    self.notice = Notice::None;
                    self.screen = Screen::Unlocking {
                        remaining: self.latencies.unlocking,
                        username: username.clone(),
                    };
                } else {
                    self.notice = Notice::Incorrect;
                }
            }
            (Screen::SetupPrompt { username }, "Setup later") => {
                self.complete_sign_in(username.clone());
            }
            (Screen::Home, "Sign in") if self.signed_out => {
                self.screen = Screen::Credentials;
                self.notice = Notice::None;
            }
            (Screen::Home, "Sign out") if !self.signed_out => {
                self.signed_out = true;
            }
            (Screen::Home, "Add account") if !self.signed_out => {
                self.screen = Screen::Credentials;
                self.notice = Notice::None;
            }
            (Screen::Home, "Remove account") => {
                self.signed_in = None;
                self.signed_out = false;
                self.screen = Screen::Welcome;
            }
            (Screen::Home, "Split addresses toggle") => {
                self.split_addresses = !self.split_addresses;
            }
            _ => {}
        }
    }

    fn tick(&mut self) {
        match &mut self.screen {
            Screen::SigningIn { remaining } => {
                if *remaining > 0 {
                    *remaining -= 1;
                } else {
                    match self.pending.take() {
                        Some(Resolution::Setup { username }) => {
                            self.screen = Screen::SetupPrompt { username };
                        }
                        Some(Resolution::Unlock { username }) => {
                            self.screen = Screen::MailboxUnlock { username };
                        }
                        Some(Resolution::Reject(notice)) => {
                            self.notice = notice;
                            self.screen = Screen::Credentials;
                        }
                        None => self.screen = Screen::Credentials,
                    }
                }
            }
            Screen::Unlocking {
                remaining,
                username,
            } => {
                if *remaining > 0 {
                    *remaining -= 1;
                } else {
                    let username = username.clone();
                    self.screen = Screen::SetupPrompt { username };
                }
            }
            Screen::Home => {
                if self.sync_remaining > 0 {
                    self.sync_remaining -= 1;
                }
            }
            _ => {}
        }
    }

    fn notice_specs(&self, specs: &mut Vec<Spec>) {
        match self.notice {
            Notice::None => {}
            Notice::Empty {
                username_missing,
                password_missing,
            } => {
                if username_missing {
                    specs.push(Spec::new(Role::Text, "Enter email or username"));
                }
                if password_missing {
                    specs.push(Spec::new(Role::Text, "Enter password"));
                }
            }
            Notice::Incorrect => {
                specs.push(Spec::new(Role::Text, "Incorrect login credentials"));
            }
            Notice::Disabled => {
                specs.push(Spec::new(Role::Text, DISABLED_NOTICE));
            }
            Notice::Free => {
                specs.push(Spec::new(Role::Dialog, "Notification"));
                let dialog = specs.len() - 1;
                specs.push(Spec::new(Role::Text, FREE_PLAN_NOTICE).child_of(dialog));
            }
            Notice::AlreadySignedIn => {
                specs.push(Spec::new(Role::Dialog, "Notification"));
                let dialog = specs.len() - 1;
                specs.push(Spec::new(Role::Text, ALREADY_SIGNED_IN_NOTICE).child_of(dialog));
                specs.push(Spec::new(Role::Button, "OK").child_of(dialog));
            }
        }
    }

    fn render(&self) -> Vec<Spec> {
        let mut specs = Vec::new();
        match &self.screen {
            Screen::Welcome => {
                specs.push(Spec::new(Role::Button, "Start setup"));
            }
            Screen::Credentials => {
                specs.push(Spec::new(Role::Edit, "Username"));
                specs.push(Spec::new(Role::Edit, "Password"));
                specs.push(Spec::new(Role::Button, "Sign in"));
                specs.push(Spec::new(Role::Button, "Cancel"));
                self.notice_specs(&mut specs);
            }
            Screen::SigningIn { .. } => {
                specs.push(Spec::new(Role::Edit, "Username"));
                specs.push(Spec::new(Role::Edit, "Password"));
                specs.push(Spec::new(Role::Button, "Signing in"));
                specs.push(Spec::new(Role::Button, "Cancel"));
            }
            Screen::MailboxUnlock { .. } => {
                specs.push(Spec::new(Role::Edit, "Mailbox password"));
                specs.push(Spec::new(Role::Button, "Unlock"));
                specs.push(Spec::new(Role::Button, "Cancel"));
                self.notice_specs(&mut specs);
            }
            Screen::Unlocking { .. } => {
                specs.push(Spec::new(Role::Edit, "Mailbox password"));
                specs.push(Spec::new(Role::Button, "Unlocking"));
                specs.push(Spec::new(Role::Button, "Cancel"));
            }
            Screen::SetupPrompt { .. } => {
                specs.push(Spec::new(Role::Button, "Setup later"));
            }
            Screen::Home => {
                specs.push(Spec::new(Role::Pane, "Accounts"));
                let pane = 0;
                if self.signed_out {
                    specs.push(Spec::new(Role::Text, "Signed out").child_of(pane));
                    specs.push(Spec::new(Role::Button, "Sign in").child_of(pane));
                    specs.push(Spec::new(Role::Button, "Remove account").child_of(pane));
                } else {
                    specs.push(Spec::new(Role::Button, "Sign out").child_of(pane));
                    specs.push(Spec::new(Role::Text, "Connected").child_of(pane));
                    if self.sync_remaining > 0 {
                        specs.push(Spec::new(Role::Text, "Synchronizing (42%)").child_of(pane));
                    }
                    specs.push(
                        Spec::new(Role::CheckBox, "Split addresses toggle")
                            .child_of(pane)
                            .toggled(self.split_addresses),
                    );
                    specs.push(Spec::new(Role::Button, "Add account").child_of(pane));
                    specs.push(Spec::new(Role::Button, "Remove account").child_of(pane));
                }
            }
        }
        specs
    }
}

// =============================================================================
// COLLABORATORS
// =============================================================================

#[derive(Debug)]
struct DriverShared {
    running: AtomicBool,
    window_delay: u64,
    window_calls: AtomicU64,
    catalog: AccountCatalog,
    latencies: Latencies,
}

/// [`AppDriver`] over the simulated client
#[derive(Clone, Debug)]
pub struct MockDriver {
    ui: MockUi,
    shared: Arc<DriverShared>,
}

impl AppDriver for MockDriver {
    fn launch(&mut self) -> UitestResult<()> {
        self.ui.install_model(AppModel::new(
            self.shared.catalog.clone(),
            self.shared.latencies,
        ));
        self.shared.window_calls.store(0, Ordering::SeqCst);
        self.shared.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    fn main_window(&self) -> UitestResult<UiElement> {
        if !self.is_running() {
            return Err(UitestError::WindowUnavailable {
                message: "client is not running".into(),
            });
        }
        let calls = self.shared.window_calls.fetch_add(1, Ordering::SeqCst);
        if calls < self.shared.window_delay {
            return Err(UitestError::WindowUnavailable {
                message: "window is still starting".into(),
            });
        }
        Ok(self.ui.root())
    }

    fn terminate(&mut self) -> UitestResult<()> {
        self.shared.running.store(false, Ordering::SeqCst);
        self.ui.clear();
        Ok(())
    }
}

/// [`CredentialStore`] that records whether cleanup ran
#[derive(Clone, Debug, Default)]
pub struct MockCredentials {
    cleared: Arc<AtomicBool>,
}

impl CredentialStore for MockCredentials {
    fn clear(&mut self) -> UitestResult<()> {
        self.cleared.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// [`ScreenCapture`] returning a stub PNG
#[derive(Clone, Debug, Default)]
pub struct MockCapture;

impl MockCapture {
    /// Create a capture stub
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ScreenCapture for MockCapture {
    fn capture(&self) -> UitestResult<Vec<u8>> {
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }
}

/// Factory for a simulated client and its collaborators
#[derive(Debug)]
pub struct MockApp {
    ui: MockUi,
    window_delay: u64,
    catalog: AccountCatalog,
    latencies: Latencies,
    credentials: MockCredentials,
    driver: std::sync::OnceLock<MockDriver>,
}

impl Default for MockApp {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApp {
    /// Simulated client with the built-in account catalog
    #[must_use]
    pub fn new() -> Self {
        Self {
            ui: MockUi::new(),
            window_delay: 0,
            catalog: AccountCatalog::builtin(),
            latencies: Latencies::default(),
            credentials: MockCredentials::default(),
            driver: std::sync::OnceLock::new(),
        }
    }

    /// Fail the first `polls` window resolutions after launch
    #[must_use]
    pub fn with_window_delay(mut self, polls: u64) -> Self {
        self.window_delay = polls;
        self
    }

    /// How many polls "Signing in" stays visible after submitting
    #[must_use]
    pub fn with_signing_in_latency(mut self, polls: u32) -> Self {
        self.latencies.signing_in = polls;
        self
    }

    /// How many polls the synchronizing banner stays visible
    #[must_use]
    pub fn with_synchronizing_latency(mut self, polls: u32) -> Self {
        self.latencies.synchronizing = polls;
        self
    }

    /// Use a different account catalog
    #[must_use]
    pub fn with_catalog(mut self, catalog: AccountCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// The underlying element tree
    #[must_use]
    pub fn ui(&self) -> &MockUi {
        &self.ui
    }

    /// A driver handle; every call returns a handle onto the same client
    /// state, so one handle launching or terminating is visible to all.
    /// Configure the app before taking the first handle.
    #[must_use]
    pub fn driver(&self) -> MockDriver {
        self.driver
            .get_or_init(|| MockDriver {
                ui: self.ui.clone(),
                shared: Arc::new(DriverShared {
                    running: AtomicBool::new(false),
                    window_delay: self.window_delay,
                    window_calls: AtomicU64::new(0),
                    catalog: self.catalog.clone(),
                    latencies: self.latencies,
                }),
            })
            .clone()
    }

    /// A credential-store handle shared with [`MockApp::credentials_cleared`]
    #[must_use]
    pub fn credentials(&self) -> MockCredentials {
        self.credentials.clone()
    }

    /// Whether credential cleanup has run
    #[must_use]
    pub fn credentials_cleared(&self) -> bool {
        self.credentials.cleared.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Locator;
    use crate::wait::WaitPolicy;
    use std::time::Duration;

    fn launched() -> (MockApp, UiElement) {
        let app = MockApp::new().with_signing_in_latency(1);
        let mut driver = app.driver();
        driver.launch().unwrap();
        let root = driver.main_window().unwrap();
        (app, root)
    }

    fn locator(root: &UiElement, name: &str) -> Locator {
        Locator::new(root.clone(), Selector::name(name))
            .with_policy(WaitPolicy::new(10, Duration::ZERO))
    }

    fn sign_in(root: &UiElement, username: &str, password: &str) {
        // the setup button only exists on the welcome screen
        if let Some(button) = root.try_find_first(&Selector::name("Start setup")) {
            button.click().unwrap();
        }
        locator(root, "Username").type_text(username).unwrap();
        locator(root, "Password").type_text(password).unwrap();
        locator(root, "Sign in").click().unwrap();
        locator(root, "Signing in").wait_gone().unwrap();
    }

    #[test]
    fn test_welcome_screen_shows_start_setup() {
        let (_app, root) = launched();
        assert!(locator(&root, "Start setup").exists());
    }

    #[test]
    fn test_paid_sign_in_reaches_home() {
        let (_app, root) = launched();
        let paid = AccountCatalog::builtin().paid;
        sign_in(&root, &paid.username, &paid.password);
        locator(&root, "Setup later").click().unwrap();
        assert!(locator(&root, "Sign out").exists());
        assert!(locator(&root, "Connected").exists());
    }

    #[test]
    fn test_free_account_shows_plan_notice() {
        let (_app, root) = launched();
        let free = AccountCatalog::builtin().free;
        sign_in(&root, &free.username, &free.password);
        let notice = locator(&root, FREE_PLAN_NOTICE).wait_available().unwrap();
        assert_eq!(notice.role(), Role::Text);
    }

    #[test]
    fn test_wrong_credentials_show_inline_error() {
        let (_app, root) = launched();
        sign_in(&root, "no.such.user@ferrymail.test", "nope");
        assert!(locator(&root, "Incorrect login credentials").exists());
    }

    #[test]
    fn test_empty_credentials_show_both_prompts() {
        let (_app, root) = launched();
        locator(&root, "Start setup").click().unwrap();
        locator(&root, "Sign in").click().unwrap();
        assert!(locator(&root, "Enter email or username").exists());
        assert!(locator(&root, "Enter password").exists());
    }

    #[test]
    fn test_mailbox_account_requires_unlock() {
        let (_app, root) = launched();
        let mailbox = AccountCatalog::builtin().mailbox;
        sign_in(&root, &mailbox.username, &mailbox.password);
        locator(&root, "Mailbox password")
            .type_text(&mailbox.mailbox_password)
            .unwrap();
        locator(&root, "Unlock").click().unwrap();
        locator(&root, "Unlocking").wait_gone().unwrap();
        locator(&root, "Setup later").click().unwrap();
        assert!(locator(&root, "Sign out").exists());
    }

    #[test]
    fn test_same_account_twice_raises_dialog() {
        let (_app, root) = launched();
        let paid = AccountCatalog::builtin().paid;
        sign_in(&root, &paid.username, &paid.password);
        locator(&root, "Setup later").click().unwrap();
        locator(&root, "Add account").click().unwrap();
        sign_in(&root, &paid.username, &paid.password);
        assert!(locator(&root, ALREADY_SIGNED_IN_NOTICE).exists());
        locator(&root, "OK").click().unwrap();
        locator(&root, "Cancel").click().unwrap();
        assert!(locator(&root, "Sign out").exists());
    }

    #[test]
    fn test_sign_out_and_back_in() {
        let (_app, root) = launched();
        let paid = AccountCatalog::builtin().paid;
        sign_in(&root, &paid.username, &paid.password);
        locator(&root, "Setup later").click().unwrap();
        locator(&root, "Sign out").click().unwrap();
        assert!(locator(&root, "Signed out").wait_available().is_ok());

        locator(&root, "Sign in").click().unwrap();
        sign_in(&root, &paid.username, &paid.password);
        // signed-out accounts may sign in again without the duplicate dialog
        locator(&root, "Setup later").click().unwrap();
        assert!(locator(&root, "Sign out").exists());
    }

    #[test]
    fn test_split_addresses_starts_off_and_toggles() {
        let (_app, root) = launched();
        let paid = AccountCatalog::builtin().paid;
        sign_in(&root, &paid.username, &paid.password);
        locator(&root, "Setup later").click().unwrap();

        let toggle = locator(&root, "Split addresses toggle")
            .wait_available()
            .unwrap();
        assert_eq!(toggle.toggle_state(), Some(false));
        locator(&root, "Split addresses toggle").click().unwrap();
        let toggle = locator(&root, "Split addresses toggle")
            .wait_available()
            .unwrap();
        assert_eq!(toggle.toggle_state(), Some(true));
    }

    #[test]
    fn test_remove_account_returns_to_welcome() {
        let (_app, root) = launched();
        let paid = AccountCatalog::builtin().paid;
        sign_in(&root, &paid.username, &paid.password);
        locator(&root, "Setup later").click().unwrap();
        locator(&root, "Remove account").click().unwrap();
        assert!(locator(&root, "Start setup").wait_available().is_ok());
    }

    #[test]
    fn test_typed_text_survives_ui_rebuilds() {
        let (app, root) = launched();
        locator(&root, "Start setup").click().unwrap();
        locator(&root, "Username")
            .type_text("kept@ferrymail.test")
            .unwrap();
        // submitting with an empty password rebuilds the screen with the
        // validation notice; the username field keeps its content
        locator(&root, "Sign in").click().unwrap();
        assert!(locator(&root, "Enter password").exists());
        assert_eq!(app.ui().text_of("Username"), "kept@ferrymail.test");
    }
}
