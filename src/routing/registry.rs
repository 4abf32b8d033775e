//! Handler registry
//!
//! Route manifests refer to handlers by fully-qualified name, e.g.
//! `app::merchant::controllers::reports::index`. The host application
//! registers an axum `MethodRouter` under each name before the router
//! is built; manifest entries pointing at unregistered names are
//! skipped while mounting.

use crate::server::AppState;
use axum::routing::MethodRouter;
use std::collections::HashMap;

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, MethodRouter<AppState>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, handler: MethodRouter<AppState>) {
        self.handlers.insert(key.into(), handler);
    }

    pub fn get(&self, key: &str) -> Option<MethodRouter<AppState>> {
        self.handlers.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
