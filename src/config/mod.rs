//! Configuration management for the aduo gateway

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Root directory holding one subdirectory per deployed tenant
    pub app_root: PathBuf,
    /// Ordered tenant prefixes; duplicates removed, first occurrence wins
    pub prefixes: Vec<String>,
    /// Route block of the base admin panel
    pub base_route: BaseRouteConfig,
    /// Apart mode: purge other guards' session keys on base-panel requests
    pub apart: bool,
    /// Name of the credential provider shared by every guard
    pub auth_provider: String,
    /// Session cookie name
    pub session_cookie: String,
    /// Per-tenant overrides (JSON format in env var)
    pub tenants: HashMap<String, TenantOverrides>,
    /// Users seeded into the binary's in-memory provider (JSON format in env var)
    pub bootstrap_users: HashMap<String, String>,
}

/// The base panel's route block, which tenant route configs are derived from
#[derive(Debug, Clone)]
pub struct BaseRouteConfig {
    /// URL prefix of the base panel, e.g. `admin`
    pub prefix: String,
    /// Middleware identifiers applied to the base panel
    pub middleware: Vec<String>,
    /// Handler key of a custom auth controller for the base panel
    pub auth_controller: Option<String>,
}

impl Default for BaseRouteConfig {
    fn default() -> Self {
        Self {
            prefix: "admin".to_string(),
            middleware: vec!["web".to_string(), "admin".to_string()],
            auth_controller: None,
        }
    }
}

/// Overrides for a single tenant prefix
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TenantOverrides {
    /// Replaces the base middleware list entirely. An empty list is
    /// treated as absent and keeps the base list.
    #[serde(default)]
    pub middleware: Option<Vec<String>>,
    /// Handler key of a custom auth controller for this tenant
    #[serde(default)]
    pub auth_controller: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // A malformed override map would silently change which middleware
        // protects a tenant, so it is a boot error rather than a default.
        let tenants: HashMap<String, TenantOverrides> = match env::var("ADUO_TENANT_OVERRIDES") {
            Ok(raw) => serde_json::from_str(&raw).context("Invalid ADUO_TENANT_OVERRIDES")?,
            Err(_) => HashMap::new(),
        };

        let bootstrap_users: HashMap<String, String> = match env::var("ADUO_USERS") {
            Ok(raw) => serde_json::from_str(&raw).context("Invalid ADUO_USERS")?,
            Err(_) => HashMap::new(),
        };

        Ok(Self {
            http_host: env::var("ADUO_HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("ADUO_HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid ADUO_HTTP_PORT")?,
            app_root: env::var("ADUO_APP_ROOT")
                .unwrap_or_else(|_| "./app".to_string())
                .into(),
            prefixes: dedup_ordered(parse_list(
                &env::var("ADUO_PREFIXES").unwrap_or_default(),
            )),
            base_route: BaseRouteConfig {
                prefix: env::var("ADUO_BASE_PREFIX").unwrap_or_else(|_| "admin".to_string()),
                middleware: parse_list(
                    &env::var("ADUO_BASE_MIDDLEWARE").unwrap_or_else(|_| "web,admin".to_string()),
                ),
                auth_controller: env::var("ADUO_BASE_AUTH_CONTROLLER").ok(),
            },
            apart: env::var("ADUO_APART")
                .map(|s| s.to_lowercase() != "false")
                .unwrap_or(true),
            auth_provider: env::var("ADUO_AUTH_PROVIDER").unwrap_or_else(|_| "admin".to_string()),
            session_cookie: env::var("ADUO_SESSION_COOKIE")
                .unwrap_or_else(|_| "aduo_session".to_string()),
            tenants,
            bootstrap_users,
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Remove duplicate entries, keeping the first occurrence of each
pub fn dedup_ordered(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
