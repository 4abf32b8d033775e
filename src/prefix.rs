//! Admin prefix token and the naming conventions derived from it
//!
//! Every admin area is addressed by a prefix token (`admin`, `merchant`,
//! `supplier`, ...). The token doubles as the guard name, the first URL
//! segment, and the stem of the tenant's route namespace and directory.

use serde::Serialize;
use std::path::{Path, PathBuf};

// Regex for prefix token validation
lazy_static::lazy_static! {
    pub static ref PREFIX_REGEX: regex::Regex = regex::Regex::new(r"^\w+$").unwrap();
}

/// A validated admin prefix token.
///
/// Only word characters are allowed, so a prefix is always safe to embed
/// in URLs, guard names, session keys and filesystem paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Prefix(String);

impl Prefix {
    /// Parse a raw token, returning `None` when it fails the token check.
    pub fn parse(raw: &str) -> Option<Self> {
        if PREFIX_REGEX.is_match(raw) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Route namespace for this prefix, e.g. `app::merchant::controllers`.
    pub fn namespace(&self) -> String {
        format!("app::{}::controllers", self.0)
    }

    /// Handler key of the default auth controller for this prefix.
    pub fn default_auth_controller(&self) -> String {
        format!("{}::auth", self.namespace())
    }

    /// Directory name of the tenant under the app root: the prefix with
    /// its first character upper-cased, e.g. `merchant` -> `Merchant`.
    pub fn directory_name(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }

    /// Tenant directory holding this prefix's route manifests.
    pub fn tenant_dir(&self, app_root: &Path) -> PathBuf {
        app_root.join(self.directory_name())
    }
}

impl std::fmt::Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Prefix {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Prefix::parse(s).ok_or_else(|| format!("Invalid admin prefix: {}", s))
    }
}
