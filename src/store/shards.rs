//! Shard store: one row batch per (table, year, month)

use bson::{doc, DateTime};
use tracing::debug;

use crate::db::schemas::{ShardDoc, SHARD_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{Result, Row, ShardId, TableStoreError};

/// Key-addressed storage of row batches
#[async_trait::async_trait]
pub trait ShardStore: Send + Sync {
    /// Rows of one shard; `NotFound` if the shard was never written
    async fn get_rows(&self, shard: ShardId) -> Result<Vec<Row>>;

    /// Create or overwrite the full row sequence of one shard
    async fn put_rows(&self, shard: ShardId, rows: &[Row]) -> Result<()>;
}

pub(crate) fn shard_not_found(shard: ShardId) -> TableStoreError {
    TableStoreError::NotFound(format!("shard {}", shard))
}

/// MongoDB-backed shard store over the `TableData` collection
pub struct MongoShardStore {
    collection: MongoCollection<ShardDoc>,
}

impl MongoShardStore {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let collection = mongo.collection::<ShardDoc>(SHARD_COLLECTION).await?;
        Ok(Self { collection })
    }
}

#[async_trait::async_trait]
impl ShardStore for MongoShardStore {
    async fn get_rows(&self, shard: ShardId) -> Result<Vec<Row>> {
        self.collection
            .find_one(doc! { "_id": shard.as_object_id() })
            .await?
            .map(|doc| doc.rows)
            .ok_or_else(|| shard_not_found(shard))
    }

    async fn put_rows(&self, shard: ShardId, rows: &[Row]) -> Result<()> {
        let encoded = ShardDoc::rows_to_bson(rows)?;
        let now = DateTime::now();

        self.collection
            .upsert_one(
                doc! { "_id": shard.as_object_id() },
                doc! {
                    "$set": { "rows": encoded, "metadata.updated_at": now },
                    "$setOnInsert": { "metadata.created_at": now },
                },
            )
            .await?;

        debug!("Stored {} rows in shard {}", rows.len(), shard);
        Ok(())
    }
}
