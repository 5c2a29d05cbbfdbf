//! In-memory permission directory for development mode and tests

use dashmap::DashMap;
use std::collections::HashSet;
use tracing::info;

use super::{require_key, require_principal, PermissionDirectory};
use crate::types::Result;

/// Permission sets held in a concurrent map
#[derive(Default)]
pub struct InMemoryPermissionDirectory {
    sets: DashMap<String, HashSet<String>>,
}

impl InMemoryPermissionDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PermissionDirectory for InMemoryPermissionDirectory {
    async fn is_member(&self, principal: &str, key: &str) -> Result<bool> {
        Ok(self
            .sets
            .get(key)
            .map(|members| members.contains(principal))
            .unwrap_or(false))
    }

    async fn grant(&self, principal: &str, key: &str) -> Result<()> {
        require_key(key)?;
        require_principal(principal)?;

        self.sets
            .entry(key.to_string())
            .or_default()
            .insert(principal.to_string());

        info!("Granted permission key {} to {}", key, principal);
        Ok(())
    }

    async fn revoke(&self, principal: &str, key: &str) -> Result<()> {
        require_key(key)?;
        require_principal(principal)?;

        // Emptied sets stay behind as empty records
        if let Some(mut members) = self.sets.get_mut(key) {
            members.remove(principal);
        }

        info!("Revoked permission key {} from {}", key, principal);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .sets
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn list_members(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .sets
            .get(key)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }
}
