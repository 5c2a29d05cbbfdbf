//! MongoDB client and collection wrapper

use bson::{doc, DateTime, Document};
use futures::TryStreamExt;
use mongodb::{
    options::{FindOptions, IndexOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::db::schemas::Metadata;
use crate::types::{Result, TableStoreError};

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri).await.map_err(|e| {
            TableStoreError::BackendUnavailable(format!("Failed to connect to MongoDB: {}", e))
        })?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| TableStoreError::BackendUnavailable(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    /// Create a new collection and apply indexes
    pub async fn new(client: &Client, db_name: &str, collection_name: &str) -> Result<Self> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<()> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner.create_indexes(indices).await.map_err(|e| {
            TableStoreError::BackendUnavailable(format!("Failed to create indexes: {}", e))
        })?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<()> {
        let metadata = item.mut_metadata();
        metadata.created_at = Some(DateTime::now());
        metadata.updated_at = Some(DateTime::now());

        self.inner
            .insert_one(item)
            .await
            .map_err(|e| TableStoreError::BackendUnavailable(format!("Insert failed: {}", e)))?;

        Ok(())
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| TableStoreError::BackendUnavailable(format!("Find failed: {}", e)))
    }

    /// Find every document matching a filter, in `sort` order
    pub async fn find_many(
        &self,
        filter: Document,
        sort: Document,
        projection: Option<Document>,
    ) -> Result<Vec<T>> {
        let options = FindOptions::builder()
            .sort(sort)
            .projection(projection)
            .build();

        self.collect(filter, options).await
    }

    /// Find at most `limit` documents matching a filter, in `sort` order
    pub async fn find_page(&self, filter: Document, sort: Document, limit: i64) -> Result<Vec<T>> {
        let options = FindOptions::builder().sort(sort).limit(limit).build();

        self.collect(filter, options).await
    }

    async fn collect(&self, filter: Document, options: FindOptions) -> Result<Vec<T>> {
        let cursor = self
            .inner
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| TableStoreError::BackendUnavailable(format!("Find failed: {}", e)))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| TableStoreError::BackendUnavailable(format!("Cursor failed: {}", e)))
    }

    /// Count documents matching a filter
    pub async fn count(&self, filter: Document) -> Result<u64> {
        self.inner
            .count_documents(filter)
            .await
            .map_err(|e| TableStoreError::BackendUnavailable(format!("Count failed: {}", e)))
    }

    /// Update one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult> {
        self.inner
            .update_one(filter, update)
            .await
            .map_err(|e| TableStoreError::BackendUnavailable(format!("Update failed: {}", e)))
    }

    /// Update one document, inserting it if no document matches
    pub async fn upsert_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult> {
        self.inner
            .update_one(filter, update)
            .upsert(true)
            .await
            .map_err(|e| TableStoreError::BackendUnavailable(format!("Upsert failed: {}", e)))
    }

    /// Delete one document; deleting nothing is not an error
    pub async fn delete_one(&self, filter: Document) -> Result<u64> {
        let result = self
            .inner
            .delete_one(filter)
            .await
            .map_err(|e| TableStoreError::BackendUnavailable(format!("Delete failed: {}", e)))?;

        Ok(result.deleted_count)
    }
}

/// `$set` body that also stamps `metadata.updated_at`
pub fn set_with_timestamp(mut fields: Document) -> Document {
    fields.insert("metadata.updated_at", DateTime::now());
    doc! { "$set": fields }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_with_timestamp() {
        let update = set_with_timestamp(doc! { "name": "Budget" });
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("name").unwrap(), "Budget");
        assert!(set.get_datetime("metadata.updated_at").is_ok());
    }
}
