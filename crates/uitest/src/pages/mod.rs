//! Page objects for the Ferrymail client surfaces.
//!
//! Each page object wraps an [`crate::session::AppWindow`] and exposes the
//! intent-level operations the scenarios script against. Element lookup
//! details stay in here; the scenarios never touch selectors directly.

mod home;
mod login;

pub use home::{
    HomeChecks, HomePage, ALREADY_SIGNED_IN_NOTICE, DISABLED_NOTICE, FREE_PLAN_NOTICE,
};
pub use login::LoginPage;
