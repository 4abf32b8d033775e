//! Middleware chain assembly
//!
//! A chain is an ordered list of named steps. Tenant chains are derived
//! from the base panel's list: host-level steps are stripped and the
//! tenant trio (session context, prefix binder, admin group) is pushed
//! in front, so every admin area runs the same stack under its own
//! guard. Steps are attached to the router in reverse because axum
//! layers wrap bottom-up.

use crate::middleware;
use crate::prefix::Prefix;
use crate::server::AppState;
use axum::extract::{Request, State};
use axum::middleware::{from_fn, from_fn_with_state, Next};
use axum::Router;
use tracing::warn;

/// One step of an admin middleware chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStep {
    /// `web`: opens the cookie session for the request.
    Web,
    /// `admin`: the base panel's admin group. Expands to the same stack
    /// as [`ChainStep::AdminGroup`], bound to the base guard.
    Admin,
    /// `lad.prefix:<p>`: binds the request to a tenant prefix and guard.
    Prefix(Prefix),
    /// `lad.admin`: the tenant admin group.
    AdminGroup,
    /// `lad.auth`: requires a logged-in user for the current guard.
    Auth,
    /// `lad.guards`: ensures a current guard, falling back to the base.
    Guards,
    /// `admin.log`: records authenticated operations.
    OperationLog,
    /// `admin.bootstrap`: installs the tenant context.
    Bootstrap,
    /// `admin.permission`: consults the permission gate.
    Permission,
    /// A step this gateway has no layer for; skipped with a warning.
    Custom(String),
}

/// Steps the admin groups expand to, in execution order.
pub const ADMIN_GROUP_STEPS: [ChainStep; 5] = [
    ChainStep::Auth,
    ChainStep::Guards,
    ChainStep::OperationLog,
    ChainStep::Bootstrap,
    ChainStep::Permission,
];

impl ChainStep {
    /// Parse a step identifier. Unknown identifiers and prefix binders
    /// with an invalid token survive as [`ChainStep::Custom`].
    pub fn parse(raw: &str) -> Self {
        match raw {
            "web" => ChainStep::Web,
            "admin" => ChainStep::Admin,
            "lad.admin" => ChainStep::AdminGroup,
            "lad.auth" => ChainStep::Auth,
            "lad.guards" => ChainStep::Guards,
            "admin.log" => ChainStep::OperationLog,
            "admin.bootstrap" => ChainStep::Bootstrap,
            "admin.permission" => ChainStep::Permission,
            _ => match raw.strip_prefix("lad.prefix:").and_then(Prefix::parse) {
                Some(prefix) => ChainStep::Prefix(prefix),
                None => ChainStep::Custom(raw.to_string()),
            },
        }
    }
}

impl std::fmt::Display for ChainStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainStep::Web => write!(f, "web"),
            ChainStep::Admin => write!(f, "admin"),
            ChainStep::Prefix(prefix) => write!(f, "lad.prefix:{}", prefix),
            ChainStep::AdminGroup => write!(f, "lad.admin"),
            ChainStep::Auth => write!(f, "lad.auth"),
            ChainStep::Guards => write!(f, "lad.guards"),
            ChainStep::OperationLog => write!(f, "admin.log"),
            ChainStep::Bootstrap => write!(f, "admin.bootstrap"),
            ChainStep::Permission => write!(f, "admin.permission"),
            ChainStep::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// An ordered middleware chain for one admin area.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MiddlewareChain {
    steps: Vec<ChainStep>,
}

impl MiddlewareChain {
    /// Chain for the base panel: identifiers are applied verbatim.
    pub fn base(identifiers: &[String]) -> Self {
        Self {
            steps: identifiers.iter().map(|id| ChainStep::parse(id)).collect(),
        }
    }

    /// Chain for a tenant. The host's `web` and `admin` steps are
    /// stripped, then `web`, the prefix binder and the tenant admin
    /// group are pushed in front; any remaining steps keep their order
    /// behind the group.
    pub fn for_tenant(identifiers: &[String], prefix: &Prefix) -> Self {
        let mut steps: Vec<ChainStep> = identifiers
            .iter()
            .map(|id| ChainStep::parse(id))
            .filter(|step| !matches!(step, ChainStep::Web | ChainStep::Admin))
            .collect();
        steps.insert(0, ChainStep::AdminGroup);
        steps.insert(0, ChainStep::Prefix(prefix.clone()));
        steps.insert(0, ChainStep::Web);
        Self { steps }
    }

    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    /// Step identifiers in chain order, groups unexpanded.
    pub fn identifiers(&self) -> Vec<String> {
        self.steps.iter().map(ToString::to_string).collect()
    }

    /// Flat step list with admin groups expanded, in execution order.
    pub fn expanded(&self) -> Vec<ChainStep> {
        let mut flat = Vec::new();
        for step in &self.steps {
            match step {
                ChainStep::Admin | ChainStep::AdminGroup => {
                    flat.extend(ADMIN_GROUP_STEPS.iter().cloned())
                }
                other => flat.push(other.clone()),
            }
        }
        flat
    }

    /// Attach the chain's layers to a router so that request execution
    /// order matches chain order.
    pub fn apply(&self, router: Router<AppState>, state: &AppState) -> Router<AppState> {
        let mut router = router;
        for step in self.steps.iter().rev() {
            router = attach(step, router, state);
        }
        router
    }
}

fn attach(step: &ChainStep, router: Router<AppState>, state: &AppState) -> Router<AppState> {
    match step {
        ChainStep::Web => router.layer(from_fn_with_state(
            state.clone(),
            middleware::web::open_session,
        )),
        ChainStep::Prefix(prefix) => {
            let prefix = prefix.clone();
            router.layer(from_fn_with_state(
                state.clone(),
                move |state: State<AppState>, req: Request, next: Next| {
                    let prefix = prefix.clone();
                    async move { middleware::prefix::bind_prefix(prefix, state, req, next).await }
                },
            ))
        }
        ChainStep::Admin | ChainStep::AdminGroup => {
            let mut router = router;
            for step in ADMIN_GROUP_STEPS.iter().rev() {
                router = attach(step, router, state);
            }
            router
        }
        ChainStep::Auth => router.layer(from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        )),
        ChainStep::Guards => router.layer(from_fn_with_state(
            state.clone(),
            middleware::guards::ensure_guard,
        )),
        ChainStep::OperationLog => router.layer(from_fn(middleware::log::operation_log)),
        ChainStep::Bootstrap => router.layer(from_fn_with_state(
            state.clone(),
            middleware::bootstrap::install_context,
        )),
        ChainStep::Permission => router.layer(from_fn_with_state(
            state.clone(),
            middleware::permission::check_permission,
        )),
        ChainStep::Custom(name) => {
            warn!(step = %name, "no middleware layer registered for step, skipping");
            router
        }
    }
}
