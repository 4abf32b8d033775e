//! Operation log middleware (the `admin.log` step)

use crate::middleware::auth::AuthedUser;
use axum::{
    body::Body, extract::OriginalUri, http::Request, middleware::Next, response::Response,
};
use tracing::info;

/// Records every authenticated admin operation. Requests without a user
/// (the auth pass-through paths) are forwarded silently.
pub async fn operation_log(request: Request<Body>, next: Next) -> Response {
    if let Some(user) = request.extensions().get::<AuthedUser>() {
        let path = request
            .extensions()
            .get::<OriginalUri>()
            .map(|uri| uri.0.path().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());
        info!(
            guard = %user.guard,
            user = %user.user_id,
            method = %request.method(),
            path = %path,
            "admin operation"
        );
    }
    next.run(request).await
}
