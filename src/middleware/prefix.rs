//! Prefix binder middleware (the `lad.prefix:<p>` step)
//!
//! Stamps the tenant prefix and its guard onto the request, upstream of
//! everything else in the tenant admin group.

use crate::middleware::guards::CurrentGuard;
use crate::prefix::Prefix;
use crate::server::AppState;
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use tracing::warn;

/// Prefix bound to the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundPrefix(pub Prefix);

pub async fn bind_prefix(
    prefix: Prefix,
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(BoundPrefix(prefix.clone()));

    match state.guards.get(prefix.as_str()) {
        Some(guard) => {
            request.extensions_mut().insert(CurrentGuard(guard.clone()));
        }
        // Guards for mounted prefixes are registered at boot; a miss
        // means the chain was assembled by hand.
        None => warn!(prefix = %prefix, "no guard registered for bound prefix"),
    }

    next.run(request).await
}
