//! External identity collaborator.
//!
//! The catalog treats the authentication system as an opaque
//! user-identity store. Provisioning suppresses outbound welcome
//! messaging and sets a permanent initial credential; both behaviors
//! belong to the provider, not to this trait's callers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use strata_core::error::{Error, Result};

/// Opaque identity provisioning API.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provisions an identity for `email`, returning the external
    /// username assigned by the provider.
    async fn create_identity(&self, email: &str) -> Result<String>;

    /// Deletes the identity for `email`.
    ///
    /// Returns `true` when the identity was deleted or was already
    /// absent. An `Err` means the identity store is in an unknown
    /// state and callers must treat the failure as fatal.
    async fn delete_identity(&self, email: &str) -> Result<bool>;

    /// Resolves a provider realm/pool by name, if one exists.
    async fn find_realm_id(&self, name: &str) -> Result<Option<String>>;
}

/// In-memory identity provider for tests and local tooling.
#[derive(Debug, Default)]
pub struct MemoryIdentity {
    identities: RwLock<HashMap<String, String>>,
    realms: RwLock<HashMap<String, String>>,
    fail_deletes: RwLock<bool>,
}

impl MemoryIdentity {
    /// Creates a new empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a realm name → ID mapping.
    pub fn add_realm(&self, name: &str, id: &str) {
        if let Ok(mut realms) = self.realms.write() {
            realms.insert(name.to_string(), id.to_string());
        }
    }

    /// Makes every subsequent `delete_identity` call fail.
    pub fn fail_deletes(&self) {
        if let Ok(mut flag) = self.fail_deletes.write() {
            *flag = true;
        }
    }

    /// Returns true when an identity exists for `email`.
    #[must_use]
    pub fn contains(&self, email: &str) -> bool {
        self.identities
            .read()
            .map(|m| m.contains_key(email))
            .unwrap_or(false)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn create_identity(&self, email: &str) -> Result<String> {
        let username = format!("ext-{email}");
        self.identities
            .write()
            .map_err(|_| Error::storage("lock poisoned"))?
            .insert(email.to_string(), username.clone());
        Ok(username)
    }

    async fn delete_identity(&self, email: &str) -> Result<bool> {
        let failing = self.fail_deletes.read().map(|f| *f).unwrap_or(false);
        if failing {
            return Err(Error::storage(format!(
                "injected identity deletion failure for {email}"
            )));
        }
        self.identities
            .write()
            .map_err(|_| Error::storage("lock poisoned"))?
            .remove(email);
        // Absent identities report success: the caller's goal state is
        // "no identity", and it holds either way.
        Ok(true)
    }

    async fn find_realm_id(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .realms
            .read()
            .map_err(|_| Error::storage("lock poisoned"))?
            .get(name)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_delete_roundtrip() {
        let provider = MemoryIdentity::new();
        let username = provider.create_identity("a@x.com").await.unwrap();
        assert_eq!(username, "ext-a@x.com");
        assert!(provider.contains("a@x.com"));

        assert!(provider.delete_identity("a@x.com").await.unwrap());
        assert!(!provider.contains("a@x.com"));

        // Deleting an absent identity still reports success.
        assert!(provider.delete_identity("a@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn realm_lookup() {
        let provider = MemoryIdentity::new();
        provider.add_realm("prod", "realm-1");
        assert_eq!(
            provider.find_realm_id("prod").await.unwrap(),
            Some("realm-1".to_string())
        );
        assert_eq!(provider.find_realm_id("ghost").await.unwrap(), None);
    }
}
