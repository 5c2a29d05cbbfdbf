//! Shared fixtures for integration tests

#![allow(dead_code)]

use rand::Rng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tabula::permissions::{InMemoryPermissionDirectory, PermissionDirectory};
use tabula::store::{InMemoryShardStore, InMemoryTableCatalog, ShardStore};
use tabula::types::{Result, Row, ShardId, TableStoreError};
use tabula::{FanoutConfig, StoreContext, TableService};

pub fn row(value: serde_json::Value) -> Row {
    value.as_object().cloned().expect("row fixture must be an object")
}

pub fn rows(values: &[serde_json::Value]) -> Vec<Row> {
    values.iter().cloned().map(row).collect()
}

/// Service over in-memory backends, with handles kept for inspection
pub struct Fixture {
    pub service: TableService,
    pub permissions: Arc<CountingDirectory>,
    pub shards: Arc<dyn ShardStore>,
}

pub fn fixture() -> Fixture {
    fixture_with(Arc::new(InMemoryShardStore::new()), FanoutConfig::default())
}

pub fn fixture_with(shards: Arc<dyn ShardStore>, fanout: FanoutConfig) -> Fixture {
    let permissions = Arc::new(CountingDirectory::default());
    let ctx = StoreContext::new(
        permissions.clone(),
        Arc::new(InMemoryTableCatalog::new()),
        Arc::clone(&shards),
    );
    Fixture {
        service: TableService::new(ctx, fanout),
        permissions,
        shards,
    }
}

// =============================================================================
// Permission directory that counts membership lookups
// =============================================================================

#[derive(Default)]
pub struct CountingDirectory {
    inner: InMemoryPermissionDirectory,
    lookups: AtomicUsize,
    unreachable: AtomicBool,
}

impl CountingDirectory {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Make membership lookups fail with a backend error
    pub fn set_unreachable(&self, down: bool) {
        self.unreachable.store(down, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl PermissionDirectory for CountingDirectory {
    async fn is_member(&self, principal: &str, key: &str) -> Result<bool> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(TableStoreError::BackendUnavailable(
                "permission store unreachable".into(),
            ));
        }
        self.inner.is_member(principal, key).await
    }

    async fn grant(&self, principal: &str, key: &str) -> Result<()> {
        self.inner.grant(principal, key).await
    }

    async fn revoke(&self, principal: &str, key: &str) -> Result<()> {
        self.inner.revoke(principal, key).await
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        self.inner.list_keys().await
    }

    async fn list_members(&self, key: &str) -> Result<Vec<String>> {
        self.inner.list_members(key).await
    }
}

// =============================================================================
// Shard stores with injected behavior
// =============================================================================

/// Delays every read by a random amount and records peak concurrency
pub struct JitteryShardStore {
    inner: InMemoryShardStore,
    max_delay_ms: u64,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl JitteryShardStore {
    pub fn new(max_delay_ms: u64) -> Self {
        Self {
            inner: InMemoryShardStore::new(),
            max_delay_ms,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ShardStore for JitteryShardStore {
    async fn get_rows(&self, shard: ShardId) -> Result<Vec<Row>> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = rand::thread_rng().gen_range(0..=self.max_delay_ms);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        let result = self.inner.get_rows(shard).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn put_rows(&self, shard: ShardId, rows: &[Row]) -> Result<()> {
        self.inner.put_rows(shard, rows).await
    }
}

/// Fails reads of selected shards with a backend error
#[derive(Default)]
pub struct FlakyShardStore {
    inner: InMemoryShardStore,
    failing: std::sync::Mutex<HashSet<ShardId>>,
    completed_reads: AtomicUsize,
}

impl FlakyShardStore {
    pub fn fail(&self, shard: ShardId) {
        self.failing.lock().unwrap().insert(shard);
    }

    pub fn completed_reads(&self) -> usize {
        self.completed_reads.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ShardStore for FlakyShardStore {
    async fn get_rows(&self, shard: ShardId) -> Result<Vec<Row>> {
        let fails = self.failing.lock().unwrap().contains(&shard);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.completed_reads.fetch_add(1, Ordering::SeqCst);

        if fails {
            return Err(TableStoreError::BackendUnavailable(format!(
                "shard {} unreachable",
                shard
            )));
        }
        self.inner.get_rows(shard).await
    }

    async fn put_rows(&self, shard: ShardId, rows: &[Row]) -> Result<()> {
        self.inner.put_rows(shard, rows).await
    }
}

/// Reads never finish within a test's lifetime
#[derive(Default)]
pub struct StalledShardStore {
    inner: InMemoryShardStore,
}

#[async_trait::async_trait]
impl ShardStore for StalledShardStore {
    async fn get_rows(&self, _shard: ShardId) -> Result<Vec<Row>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }

    async fn put_rows(&self, shard: ShardId, rows: &[Row]) -> Result<()> {
        self.inner.put_rows(shard, rows).await
    }
}
