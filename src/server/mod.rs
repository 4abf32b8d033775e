//! Server initialization and routing
//!
//! Boot order: register guards for every valid prefix, then mount the
//! base panel and one nested router per tenant, each wrapped in its own
//! middleware chain. A tenant that fails a check is skipped with a log
//! line and never takes the base panel down.

use crate::api;
use crate::auth::controller::ControllerRegistry;
use crate::auth::{CredentialProvider, MemoryCredentialProvider, ProviderRegistry};
use crate::config::Config;
use crate::guard::GuardRegistry;
use crate::middleware::permission::{AllowAll, PermissionGate};
use crate::prefix::Prefix;
use crate::routing::builder::{self, RouteConfig};
use crate::routing::chain::MiddlewareChain;
use crate::routing::loader;
use crate::routing::registry::HandlerRegistry;
use crate::session::isolator::isolate_base_session;
use crate::session::{MemoryBackend, SessionBackend, SessionManager};
use anyhow::Result;
use axum::routing::MethodRouter;
use axum::{routing::get, Router};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub guards: Arc<GuardRegistry>,
    pub sessions: SessionManager,
    pub providers: Arc<ProviderRegistry>,
    pub handlers: Arc<HandlerRegistry>,
    pub controllers: Arc<ControllerRegistry>,
    pub permission_gate: Arc<dyn PermissionGate>,
    /// Console contexts skip apart-mode purges.
    pub console: bool,
}

impl AppState {
    pub fn builder(config: Config) -> AppStateBuilder {
        AppStateBuilder::new(config)
    }

    /// Route namespace of the base panel.
    pub fn base_namespace(&self) -> String {
        format!("app::{}::controllers", self.config.base_route.prefix)
    }
}

/// Assembles an [`AppState`]: registries, guards and the session store.
pub struct AppStateBuilder {
    config: Config,
    providers: ProviderRegistry,
    handlers: HandlerRegistry,
    controllers: ControllerRegistry,
    permission_gate: Arc<dyn PermissionGate>,
    session_backend: Option<Arc<dyn SessionBackend>>,
    console: bool,
}

impl AppStateBuilder {
    fn new(config: Config) -> Self {
        Self {
            config,
            providers: ProviderRegistry::new(),
            handlers: HandlerRegistry::new(),
            controllers: ControllerRegistry::new(),
            permission_gate: Arc::new(AllowAll),
            session_backend: None,
            console: false,
        }
    }

    /// Register a credential provider under a name.
    pub fn credential_provider(
        mut self,
        name: impl Into<String>,
        provider: Arc<dyn CredentialProvider>,
    ) -> Self {
        self.providers.register(name, provider);
        self
    }

    /// Register a route handler under its fully-qualified name, e.g.
    /// `app::merchant::controllers::reports::index`.
    pub fn handler(mut self, key: impl Into<String>, handler: MethodRouter<AppState>) -> Self {
        self.handlers.register(key, handler);
        self
    }

    /// Register a custom auth controller under its handler key.
    pub fn auth_controller(mut self, key: impl Into<String>, controller: Router<AppState>) -> Self {
        self.controllers.register(key, controller);
        self
    }

    pub fn permission_gate(mut self, gate: Arc<dyn PermissionGate>) -> Self {
        self.permission_gate = gate;
        self
    }

    pub fn session_backend(mut self, backend: Arc<dyn SessionBackend>) -> Self {
        self.session_backend = Some(backend);
        self
    }

    /// Mark the state as belonging to a console context.
    pub fn console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn build(mut self) -> Result<AppState> {
        if Prefix::parse(&self.config.base_route.prefix).is_none() {
            anyhow::bail!(
                "Invalid base admin prefix: {}",
                self.config.base_route.prefix
            );
        }

        let mut guards =
            GuardRegistry::new(&self.config.base_route.prefix, &self.config.auth_provider);
        for raw in &self.config.prefixes {
            if raw == &self.config.base_route.prefix {
                continue;
            }
            match Prefix::parse(raw) {
                Some(prefix) => guards.register(&prefix),
                None => warn!(prefix = %raw, "ignoring invalid admin prefix"),
            }
        }

        if !self.providers.contains(&self.config.auth_provider) {
            warn!(
                provider = %self.config.auth_provider,
                "no credential provider registered, logins will fail"
            );
            self.providers.register(
                self.config.auth_provider.clone(),
                Arc::new(MemoryCredentialProvider::new()),
            );
        }

        let backend = self
            .session_backend
            .unwrap_or_else(|| Arc::new(MemoryBackend::new()));
        let sessions = SessionManager::new(backend, self.config.session_cookie.clone());

        Ok(AppState {
            config: Arc::new(self.config),
            guards: Arc::new(guards),
            sessions,
            providers: Arc::new(self.providers),
            handlers: Arc::new(self.handlers),
            controllers: Arc::new(self.controllers),
            permission_gate: self.permission_gate,
            console: self.console,
        })
    }
}

/// Start the gateway
pub async fn run(config: Config) -> Result<()> {
    let provider = MemoryCredentialProvider::new();
    for (username, password) in &config.bootstrap_users {
        provider.add_user(username, password).await?;
    }
    if !config.bootstrap_users.is_empty() {
        info!(
            users = config.bootstrap_users.len(),
            "seeded in-memory credential provider"
        );
    }

    let provider_name = config.auth_provider.clone();
    let http_addr = config.http_addr();

    let state = AppState::builder(config)
        .credential_provider(provider_name, Arc::new(provider))
        .build()?;
    let app = build_router(state);

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut app = Router::new().route("/health", get(api::health));

    app = app.nest(
        &format!("/{}", config.base_route.prefix),
        base_panel_router(&state),
    );
    info!(prefix = %config.base_route.prefix, "mounted base admin panel");

    let mut mounted = HashSet::new();
    for raw in &config.prefixes {
        let Some(route_config) = builder::build(raw, &config.base_route, &config.tenants) else {
            continue;
        };
        if !mounted.insert(route_config.prefix.to_string()) {
            warn!(prefix = %route_config.prefix, "duplicate admin prefix, keeping the first");
            continue;
        }

        // An undeployed tenant keeps its guard but mounts nothing, so
        // every URL under its prefix 404s. Deployed means the tenant
        // directory and its primary manifest both exist.
        let dir = route_config.prefix.tenant_dir(&config.app_root);
        if !dir.is_dir() {
            warn!(
                prefix = %route_config.prefix,
                dir = %dir.display(),
                "tenant directory missing, mounting no routes"
            );
            continue;
        }
        let manifest = dir.join(loader::ROUTES_FILE);
        if !manifest.is_file() {
            warn!(
                prefix = %route_config.prefix,
                file = %manifest.display(),
                "primary route manifest missing, mounting no routes"
            );
            continue;
        }

        let router = tenant_router(&state, &route_config, &dir);
        app = app.nest(&format!("/{}", route_config.prefix), router);
        info!(
            prefix = %route_config.prefix,
            namespace = %route_config.namespace,
            middleware = ?route_config.middleware.identifiers(),
            "mounted tenant admin area"
        );
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// The base panel: auth controller, status endpoint, apart-mode purge,
/// all wrapped in the base middleware chain.
fn base_panel_router(state: &AppState) -> Router<AppState> {
    let base = &state.config.base_route;
    let controller_key = base
        .auth_controller
        .clone()
        .unwrap_or_else(|| format!("{}::auth", state.base_namespace()));

    let mut router = state.controllers.resolve(&controller_key);
    router = router.route("/aduo/status", get(api::status));

    // Innermost layer, so the purge runs after the chain's auth steps.
    router = router.layer(axum::middleware::from_fn_with_state(
        state.clone(),
        isolate_base_session,
    ));

    MiddlewareChain::base(&base.middleware).apply(router, state)
}

/// One deployed tenant's router: its auth controller plus every
/// manifest route with a registered handler, wrapped in the tenant's
/// middleware chain.
fn tenant_router(state: &AppState, route_config: &RouteConfig, dir: &Path) -> Router<AppState> {
    let mut router = state.controllers.resolve(&route_config.auth_controller);

    for def in loader::load(dir) {
        if def.path == "/auth/login" || def.path == "/auth/logout" {
            warn!(prefix = %route_config.prefix, path = %def.path, "manifest route shadows the auth controller, skipping");
            continue;
        }
        let key = format!("{}::{}", route_config.namespace, def.handler);
        match state.handlers.get(&key) {
            Some(handler) => {
                router = router.route(&def.path, handler);
            }
            None => warn!(
                prefix = %route_config.prefix,
                handler = %key,
                "no registered handler for manifest route, skipping"
            ),
        }
    }

    route_config.middleware.apply(router, state)
}
