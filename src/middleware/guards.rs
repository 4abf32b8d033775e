//! Guard context middleware (the `lad.guards` step)

use crate::guard::GuardBinding;
use crate::server::AppState;
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use tracing::trace;

/// The guard the request runs under, stored in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentGuard(pub GuardBinding);

/// Ensures every request past this step carries a guard. Requests not
/// bound to a tenant prefix fall back to the base guard, which is how
/// the base panel's `admin` group resolves its guard.
pub async fn ensure_guard(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if request.extensions().get::<CurrentGuard>().is_none() {
        let base = state.guards.base().clone();
        trace!(guard = %base.name, "request not bound to a prefix, using base guard");
        request.extensions_mut().insert(CurrentGuard(base));
    }
    next.run(request).await
}
