//! Apart mode: keeping the base panel's session clean
//!
//! With apart mode on, a base-panel request by an authenticated base
//! user removes every other guard's login key from the session. A stale
//! tenant login can then never leak into the base panel. Tenant areas
//! are never touched; the purge is skipped in console mode, for guests,
//! and for requests bound to a tenant prefix.

use crate::middleware::prefix::BoundPrefix;
use crate::server::AppState;
use crate::session::Session;
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use tracing::debug;

pub async fn isolate_base_session(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.apart || state.console {
        return next.run(request).await;
    }
    if request.extensions().get::<BoundPrefix>().is_some() {
        return next.run(request).await;
    }
    let Some(session) = request.extensions().get::<Session>().cloned() else {
        return next.run(request).await;
    };

    let base = state.guards.base().clone();
    if session.get(&base.session_key()).await.is_none() {
        // Guests keep whatever tenant logins they hold.
        return next.run(request).await;
    }

    for guard in state.guards.other_than(&base.name) {
        if session.remove(&guard.session_key()).await {
            debug!(
                guard = %guard.name,
                session = %session.id(),
                "purged other guard's login from base session"
            );
        }
    }

    next.run(request).await
}
