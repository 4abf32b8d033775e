//! Auth controllers
//!
//! Every admin area serves `POST /auth/login` and `POST /auth/logout`.
//! The default controller below authenticates against the guard's
//! credential provider and writes the guard's session key; tenants can
//! register their own controller under their namespace's `auth` key.

use crate::error::{AppError, Result};
use crate::middleware::guards::CurrentGuard;
use crate::server::AppState;
use crate::session::{RenewedSession, Session};
use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub guard: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Log in under the current guard. The session id is rotated so an id
/// presented before authentication never names a logged-in session.
pub async fn login(
    State(state): State<AppState>,
    Extension(mut session): Extension<Session>,
    guard: Option<Extension<CurrentGuard>>,
    Json(payload): Json<LoginRequest>,
) -> Result<(Extension<RenewedSession>, Json<LoginResponse>)> {
    payload.validate()?;

    let guard = match guard {
        Some(Extension(CurrentGuard(binding))) => binding,
        None => state.guards.base().clone(),
    };

    let provider = state.providers.get(&guard.provider).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "credential provider '{}' is not registered",
            guard.provider
        ))
    })?;

    let user_id = provider
        .verify(&payload.username, &payload.password)
        .await
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    session.rotate().await;
    session.insert(&guard.session_key(), user_id.clone()).await;
    info!(guard = %guard.name, user = %user_id, "admin login");

    Ok((
        Extension(RenewedSession(session.id().to_string())),
        Json(LoginResponse {
            user_id,
            guard: guard.name,
        }),
    ))
}

/// Log out of the current guard. Other guards' logins in the same
/// session are left alone.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    guard: Option<Extension<CurrentGuard>>,
) -> Json<MessageResponse> {
    let guard = match guard {
        Some(Extension(CurrentGuard(binding))) => binding,
        None => state.guards.base().clone(),
    };

    if session.remove(&guard.session_key()).await {
        info!(guard = %guard.name, "admin logout");
    }

    Json(MessageResponse {
        message: "Logged out".to_string(),
    })
}

/// Routes served by the default auth controller.
pub fn default_auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Auth controllers keyed by handler key, e.g.
/// `app::merchant::controllers::auth`.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Router<AppState>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, controller: Router<AppState>) {
        self.controllers.insert(key.into(), controller);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.controllers.contains_key(key)
    }

    /// Resolve a controller key, falling back to the default controller.
    pub fn resolve(&self, key: &str) -> Router<AppState> {
        match self.controllers.get(key) {
            Some(controller) => controller.clone(),
            None => default_auth_router(),
        }
    }
}
