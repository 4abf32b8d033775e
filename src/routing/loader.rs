//! Tenant route manifests
//!
//! A deployed tenant has a directory under the app root named after its
//! prefix (`Merchant` for `merchant`) holding `routes.toml` and
//! optionally `extroutes.toml`. Both list `[[route]]` entries mapping a
//! path to a handler name. Missing or broken files never take the
//! gateway down; they only shrink what gets mounted, and the same goes
//! for entries whose path the router would refuse.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

pub const ROUTES_FILE: &str = "routes.toml";
pub const EXT_ROUTES_FILE: &str = "extroutes.toml";

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteDef {
    /// Route path relative to the admin area, e.g. `/reports`.
    pub path: String,
    /// Handler name relative to the area's namespace, e.g. `reports::index`.
    pub handler: String,
}

#[derive(Debug, Default, Deserialize)]
struct RouteManifest {
    #[serde(default, rename = "route")]
    routes: Vec<RouteDef>,
}

/// Load the route definitions of one tenant directory.
///
/// The primary manifest gates the extension manifest: without a readable
/// `routes.toml` nothing is loaded at all.
pub fn load(dir: &Path) -> Vec<RouteDef> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "tenant directory missing, no routes to load");
        return Vec::new();
    }

    let mut routes = match read_manifest(&dir.join(ROUTES_FILE)) {
        Some(routes) => routes,
        None => return Vec::new(),
    };

    let ext_path = dir.join(EXT_ROUTES_FILE);
    if ext_path.is_file() {
        if let Some(ext) = read_manifest(&ext_path) {
            routes.extend(ext);
        }
    }

    normalize(routes)
}

/// Read one manifest file; `None` when it is missing or unparseable.
fn read_manifest(path: &Path) -> Option<Vec<RouteDef>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => {
            debug!(file = %path.display(), "route manifest missing, skipping");
            return None;
        }
    };

    match toml::from_str::<RouteManifest>(&raw) {
        Ok(manifest) => Some(manifest.routes),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "broken route manifest, skipping");
            None
        }
    }
}

/// Ensure leading slashes, drop entries the router would refuse, and
/// drop conflicting paths keeping the first entry, so router assembly
/// never aborts on manifest content.
fn normalize(routes: Vec<RouteDef>) -> Vec<RouteDef> {
    let mut seen = HashSet::new();
    routes
        .into_iter()
        .map(|mut def| {
            if !def.path.starts_with('/') {
                def.path.insert(0, '/');
            }
            def
        })
        .filter(|def| {
            if is_mountable(&def.path) {
                true
            } else {
                warn!(path = %def.path, "route path cannot mount, skipping");
                false
            }
        })
        .filter(|def| {
            if seen.insert(conflict_key(&def.path)) {
                true
            } else {
                warn!(path = %def.path, "conflicting route path in manifests, keeping the first");
                false
            }
        })
        .collect()
}

/// Whether the router will accept this path. Captures use the brace
/// form, `{name}` anywhere and `{*rest}` as the last segment. The
/// legacy `:name` and `*rest` forms abort router assembly, as do stray
/// or empty braces.
fn is_mountable(path: &str) -> bool {
    let Some(trimmed) = path.strip_prefix('/') else {
        return false;
    };
    let segments: Vec<&str> = trimmed.split('/').collect();
    let last = segments.len() - 1;
    segments.iter().enumerate().all(|(i, segment)| {
        if segment.starts_with(':') || segment.starts_with('*') {
            return false;
        }
        if !segment.contains(['{', '}']) {
            return true;
        }
        let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
            return false;
        };
        let name = match inner.strip_prefix('*') {
            Some(wild) if i == last => wild,
            Some(_) => return false,
            None => inner,
        };
        !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
    })
}

/// Capture segments at the same position conflict whatever their
/// names; collapse the names so the duplicate filter catches them.
fn conflict_key(path: &str) -> String {
    path.split('/')
        .map(
            |segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(inner) if inner.starts_with('*') => "{*}",
                Some(_) => "{}",
                None => segment,
            },
        )
        .collect::<Vec<_>>()
        .join("/")
}
