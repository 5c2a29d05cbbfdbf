//! Permission directory: flat membership of principals in named permission sets
//!
//! A principal either holds a permission key or it does not. There are no
//! roles or hierarchies. Tables reference a key; an empty key means the table
//! is open to every authenticated caller.

mod memory;
mod mongo;

pub use memory::InMemoryPermissionDirectory;
pub use mongo::MongoPermissionDirectory;

use crate::types::{Result, TableStoreError};

/// Membership store for permission sets
///
/// Grant and revoke have set semantics: granting an existing member or
/// revoking an absent one is a no-op, not an error.
#[async_trait::async_trait]
pub trait PermissionDirectory: Send + Sync {
    /// Whether `principal` holds `key`. Unknown keys have no members.
    async fn is_member(&self, principal: &str, key: &str) -> Result<bool>;

    /// Add `principal` to the set named `key`, creating the set if needed
    async fn grant(&self, principal: &str, key: &str) -> Result<()>;

    /// Remove `principal` from the set named `key`
    async fn revoke(&self, principal: &str, key: &str) -> Result<()>;

    /// Every key with at least one member, sorted lexicographically
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Current members of one key, in no particular order
    async fn list_members(&self, key: &str) -> Result<Vec<String>>;
}

/// Access policy shared by every table operation.
///
/// Passes when the key is empty or the principal is a member. Evaluated on
/// every call; membership may change between requests so nothing is cached.
/// The directory is not consulted at all for an empty key.
pub async fn is_allowed(
    directory: &dyn PermissionDirectory,
    principal: &str,
    permission_key: &str,
) -> Result<bool> {
    if permission_key.is_empty() {
        return Ok(true);
    }
    directory.is_member(principal, permission_key).await
}

fn require_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(TableStoreError::BadInput(
            "Permission key must not be empty".into(),
        ));
    }
    Ok(())
}

fn require_principal(principal: &str) -> Result<()> {
    if principal.trim().is_empty() {
        return Err(TableStoreError::BadInput("User id must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Directory that counts lookups and grants nothing
    #[derive(Default)]
    struct CountingDirectory {
        lookups: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl PermissionDirectory for CountingDirectory {
        async fn is_member(&self, _principal: &str, _key: &str) -> Result<bool> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }
        async fn grant(&self, _principal: &str, _key: &str) -> Result<()> {
            Ok(())
        }
        async fn revoke(&self, _principal: &str, _key: &str) -> Result<()> {
            Ok(())
        }
        async fn list_keys(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }
        async fn list_members(&self, _key: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_empty_key_skips_directory() {
        let directory = CountingDirectory::default();
        assert!(is_allowed(&directory, "anyone", "").await.unwrap());
        assert_eq!(directory.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_empty_key_consults_directory() {
        let directory = CountingDirectory::default();
        assert!(!is_allowed(&directory, "anyone", "budget-2024").await.unwrap());
        assert_eq!(directory.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_key_and_principal_required() {
        assert!(require_key("").is_err());
        assert!(require_key("  ").is_err());
        assert!(require_key("budget").is_ok());
        assert!(require_principal("").is_err());
        assert!(require_principal("u1").is_ok());
    }
}
