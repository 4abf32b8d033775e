//! aduo - Multi-prefix admin gateway
//!
//! One axum service mounts an isolated admin area under each configured
//! URL prefix: its own guard, its own login in the shared session, its
//! own middleware chain and route namespace. Tenants are configured by
//! prefix; a misconfigured tenant is skipped with a log line and never
//! takes the base panel down.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod prefix;
pub mod routing;
pub mod server;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use prefix::Prefix;
pub use server::{build_router, AppState};
