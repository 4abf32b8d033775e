//! Authentication middleware (the `lad.auth` step)
//!
//! Rejects requests whose session has no login under the current guard.
//! The auth controller's own routes pass through unauthenticated so the
//! login flow can run under the same chain.

use crate::middleware::current_guard;
use crate::server::AppState;
use crate::session::Session;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

/// Authenticated user attached to the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthedUser {
    pub user_id: String,
    pub guard: String,
}

/// Paths allowed through unauthenticated. The router nests each admin
/// area, so the chain sees area-relative paths and an exact match is
/// enough. A longer path such as `/reports/auth/login` is an ordinary
/// protected route.
fn is_auth_route(path: &str) -> bool {
    path == "/auth/login" || path == "/auth/logout"
}

pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if is_auth_route(request.uri().path()) {
        return next.run(request).await;
    }

    let Some(session) = request.extensions().get::<Session>().cloned() else {
        return unauthorized_response("No session context");
    };

    let guard = current_guard(request.extensions(), &state);
    match session.get(&guard.session_key()).await {
        Some(user_id) => {
            debug!(guard = %guard.name, user = %user_id, "authenticated");
            request.extensions_mut().insert(AuthedUser {
                user_id,
                guard: guard.name,
            });
            next.run(request).await
        }
        None => unauthorized_response("Authentication required"),
    }
}

/// Generate a 401 Unauthorized response
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": message,
            "code": "UNAUTHORIZED"
        })),
    )
        .into_response()
}
