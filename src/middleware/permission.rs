//! Permission middleware (the `admin.permission` step)
//!
//! Authenticated operations are checked against the gateway's
//! [`PermissionGate`]. The default gate allows everything; embedders
//! plug in their own role model.

use crate::middleware::auth::AuthedUser;
use crate::server::AppState;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{OriginalUri, State},
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

/// Decides whether an authenticated user may perform an operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn allows(&self, user: &AuthedUser, method: &Method, path: &str) -> bool;
}

/// Default gate: every authenticated user may do everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl PermissionGate for AllowAll {
    async fn allows(&self, _user: &AuthedUser, _method: &Method, _path: &str) -> bool {
        true
    }
}

/// Rejects operations the permission gate denies. Requests without an
/// authenticated user (the auth pass-through paths) are not checked.
pub async fn check_permission(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(user) = request.extensions().get::<AuthedUser>().cloned() else {
        return next.run(request).await;
    };

    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    if !state
        .permission_gate
        .allows(&user, request.method(), &path)
        .await
    {
        warn!(guard = %user.guard, user = %user.user_id, path = %path, "operation denied");
        return forbidden_response("Operation not permitted");
    }

    next.run(request).await
}

/// Generate a 403 Forbidden response
fn forbidden_response(message: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": message,
            "code": "FORBIDDEN"
        })),
    )
        .into_response()
}
