//! HTTP middleware for the aduo gateway
//!
//! These are the chain steps assembled by the routing layer:
//! - `web`: session context
//! - `lad.prefix:<p>`: prefix binder
//! - `lad.auth`: authentication enforcement
//! - `lad.guards`: guard fallback
//! - `admin.log`: operation log
//! - `admin.bootstrap`: tenant context
//! - `admin.permission`: permission gate

pub mod auth;
pub mod bootstrap;
pub mod guards;
pub mod log;
pub mod permission;
pub mod prefix;
pub mod web;

pub use auth::AuthedUser;
pub use bootstrap::TenantContext;
pub use guards::CurrentGuard;
pub use permission::{AllowAll, PermissionGate};
pub use prefix::BoundPrefix;

use crate::guard::GuardBinding;
use crate::server::AppState;
use axum::http::Extensions;

/// The guard a request runs under: the bound prefix's guard when the
/// prefix binder ran, the base guard otherwise.
pub(crate) fn current_guard(extensions: &Extensions, state: &AppState) -> GuardBinding {
    extensions
        .get::<CurrentGuard>()
        .map(|current| current.0.clone())
        .unwrap_or_else(|| state.guards.base().clone())
}
