//! Backend handles shared by the service and the HTTP layer

use std::sync::Arc;

use crate::db::MongoClient;
use crate::permissions::{InMemoryPermissionDirectory, MongoPermissionDirectory, PermissionDirectory};
use crate::store::{
    InMemoryShardStore, InMemoryTableCatalog, MongoShardStore, MongoTableCatalog, ShardStore,
    TableCatalog,
};
use crate::types::Result;

/// The three storage collaborators, injected at construction
#[derive(Clone)]
pub struct StoreContext {
    pub permissions: Arc<dyn PermissionDirectory>,
    pub catalog: Arc<dyn TableCatalog>,
    pub shards: Arc<dyn ShardStore>,
}

impl StoreContext {
    pub fn new(
        permissions: Arc<dyn PermissionDirectory>,
        catalog: Arc<dyn TableCatalog>,
        shards: Arc<dyn ShardStore>,
    ) -> Self {
        Self {
            permissions,
            catalog,
            shards,
        }
    }

    /// Process-local backends; nothing survives a restart
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryPermissionDirectory::new()),
            Arc::new(InMemoryTableCatalog::new()),
            Arc::new(InMemoryShardStore::new()),
        )
    }

    /// MongoDB backends sharing one client
    pub async fn mongo(client: &MongoClient, permission_scan_batch: usize) -> Result<Self> {
        let permissions = MongoPermissionDirectory::new(client, permission_scan_batch).await?;
        let catalog = MongoTableCatalog::new(client).await?;
        let shards = MongoShardStore::new(client).await?;

        Ok(Self::new(
            Arc::new(permissions),
            Arc::new(catalog),
            Arc::new(shards),
        ))
    }
}
