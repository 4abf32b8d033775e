//! Authentication guards
//!
//! Each admin prefix gets its own guard: a named authentication scope
//! with its own session key, so a login under one prefix is invisible to
//! every other prefix. All guards share one user provider by default.

use crate::prefix::Prefix;
use serde::Serialize;
use tracing::debug;

/// Guard driver kinds. Only session guards exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardDriver {
    Session,
}

/// A named guard bound to a user provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardBinding {
    pub name: String,
    pub driver: GuardDriver,
    pub provider: String,
}

impl GuardBinding {
    pub fn session(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: GuardDriver::Session,
            provider: provider.into(),
        }
    }

    /// Session key holding the authenticated user id for this guard.
    pub fn session_key(&self) -> String {
        format!("login_{}", self.name)
    }
}

/// Registry of every guard known to the gateway.
///
/// The base guard is seeded at construction; tenant guards are added in
/// prefix-list order during boot. Lookups are by guard name.
#[derive(Debug, Clone)]
pub struct GuardRegistry {
    base: String,
    provider: String,
    bindings: Vec<GuardBinding>,
}

impl GuardRegistry {
    pub fn new(base_prefix: &str, provider: &str) -> Self {
        Self {
            base: base_prefix.to_string(),
            provider: provider.to_string(),
            bindings: vec![GuardBinding::session(base_prefix, provider)],
        }
    }

    /// Register a guard for a tenant prefix. Registering the same prefix
    /// twice is a no-op; the base guard already exists.
    pub fn register(&mut self, prefix: &Prefix) {
        if self.get(prefix.as_str()).is_some() {
            return;
        }
        debug!(guard = %prefix, provider = %self.provider, "registered admin guard");
        self.bindings
            .push(GuardBinding::session(prefix.as_str(), &self.provider));
    }

    pub fn register_all<'a>(&mut self, prefixes: impl IntoIterator<Item = &'a Prefix>) {
        for prefix in prefixes {
            self.register(prefix);
        }
    }

    pub fn get(&self, name: &str) -> Option<&GuardBinding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    /// The guard of the base admin panel.
    pub fn base(&self) -> &GuardBinding {
        // The base binding is seeded in new() and never removed.
        self.bindings
            .iter()
            .find(|b| b.name == self.base)
            .unwrap_or(&self.bindings[0])
    }

    pub fn bindings(&self) -> &[GuardBinding] {
        &self.bindings
    }

    /// Every guard except the named one, in registration order.
    pub fn other_than<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a GuardBinding> {
        self.bindings.iter().filter(move |b| b.name != name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
