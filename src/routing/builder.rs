//! Per-tenant route configuration
//!
//! For every configured prefix the builder derives an immutable
//! [`RouteConfig`] from the base panel's route block plus the tenant's
//! overrides. The config is handed to router assembly as a value; the
//! base block itself is never touched.

use crate::config::{BaseRouteConfig, TenantOverrides};
use crate::prefix::Prefix;
use crate::routing::chain::MiddlewareChain;
use std::collections::HashMap;
use tracing::debug;

/// Route configuration of one admin area, fixed at assembly time.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteConfig {
    pub prefix: Prefix,
    /// Route namespace, e.g. `app::merchant::controllers`.
    pub namespace: String,
    pub middleware: MiddlewareChain,
    /// Handler key of the auth controller serving this area.
    pub auth_controller: String,
}

/// Build the route config for one tenant prefix.
///
/// Returns `None` for the base prefix, which keeps the host's own route
/// block, and for tokens that fail the prefix check.
pub fn build(
    raw_prefix: &str,
    base: &BaseRouteConfig,
    overrides: &HashMap<String, TenantOverrides>,
) -> Option<RouteConfig> {
    if raw_prefix == base.prefix {
        debug!(prefix = %raw_prefix, "base prefix keeps the host route block, skipping");
        return None;
    }

    let prefix = match Prefix::parse(raw_prefix) {
        Some(prefix) => prefix,
        None => {
            debug!(prefix = %raw_prefix, "prefix failed the token check, skipping");
            return None;
        }
    };

    let tenant = overrides.get(raw_prefix);

    // A present but empty middleware override keeps the base list.
    let middleware_ids = tenant
        .and_then(|t| t.middleware.as_deref())
        .filter(|ids| !ids.is_empty())
        .unwrap_or(&base.middleware);
    let middleware = MiddlewareChain::for_tenant(middleware_ids, &prefix);

    let auth_controller = tenant
        .and_then(|t| t.auth_controller.clone())
        .unwrap_or_else(|| prefix.default_auth_controller());

    Some(RouteConfig {
        namespace: prefix.namespace(),
        middleware,
        auth_controller,
        prefix,
    })
}
