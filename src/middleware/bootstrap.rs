//! Tenant bootstrap middleware (the `admin.bootstrap` step)
//!
//! Installs the admin area's context (prefix, route namespace, guard)
//! for downstream handlers, the way a panel would prepare its menus and
//! assets before dispatching.

use crate::middleware::current_guard;
use crate::middleware::prefix::BoundPrefix;
use crate::server::AppState;
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use tracing::trace;

/// Context of the admin area serving the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub prefix: String,
    pub namespace: String,
    pub guard: String,
}

pub async fn install_context(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let guard = current_guard(request.extensions(), &state);
    let bound = request
        .extensions()
        .get::<BoundPrefix>()
        .map(|bound| bound.0.clone());

    let context = match bound {
        Some(prefix) => TenantContext {
            namespace: prefix.namespace(),
            prefix: prefix.to_string(),
            guard: guard.name,
        },
        None => TenantContext {
            namespace: state.base_namespace(),
            prefix: state.config.base_route.prefix.clone(),
            guard: guard.name,
        },
    };

    trace!(prefix = %context.prefix, namespace = %context.namespace, "installed tenant context");
    request.extensions_mut().insert(context);
    next.run(request).await
}
