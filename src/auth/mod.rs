//! Credential providers
//!
//! Guards delegate credential checks to a named provider. The gateway
//! ships an in-memory provider with argon2-hashed passwords; embedders
//! register their own implementation under the configured provider name
//! to authenticate against a real user store.

pub mod controller;

use crate::error::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Resolves login credentials to a user id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns the user id when the credentials are valid.
    async fn verify(&self, username: &str, password: &str) -> Option<String>;
}

struct StoredUser {
    id: String,
    password_hash: String,
}

/// In-memory credential store. The user id is the username.
#[derive(Default)]
pub struct MemoryCredentialProvider {
    users: RwLock<HashMap<String, StoredUser>>,
}

impl MemoryCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, username: &str, password: &str) -> Result<()> {
        let password_hash = hash_password(password)?;
        let mut users = self.users.write().await;
        users.insert(
            username.to_string(),
            StoredUser {
                id: username.to_string(),
                password_hash,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl CredentialProvider for MemoryCredentialProvider {
    async fn verify(&self, username: &str, password: &str) -> Option<String> {
        let users = self.users.read().await;
        let user = users.get(username)?;
        match verify_password(password, &user.password_hash) {
            Ok(true) => Some(user.id.clone()),
            _ => None,
        }
    }
}

/// Credential providers keyed by name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn CredentialProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn CredentialProvider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CredentialProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }
}

/// Hash a password using Argon2
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against its hash
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
