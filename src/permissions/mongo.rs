//! MongoDB-backed permission directory
//!
//! Each permission key is one document whose `members` array is maintained
//! with `$addToSet` and `$pull`.

use bson::{doc, DateTime};
use tracing::{debug, info};

use super::{require_key, require_principal, PermissionDirectory};
use crate::db::schemas::{PermissionSetDoc, PERMISSION_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::Result;

/// Default number of keys fetched per page by `list_keys`
pub const DEFAULT_SCAN_BATCH: usize = 100;

pub struct MongoPermissionDirectory {
    collection: MongoCollection<PermissionSetDoc>,
    scan_batch: usize,
}

impl MongoPermissionDirectory {
    pub async fn new(mongo: &MongoClient, scan_batch: usize) -> Result<Self> {
        let collection = mongo
            .collection::<PermissionSetDoc>(PERMISSION_COLLECTION)
            .await?;
        Ok(Self {
            collection,
            scan_batch: scan_batch.max(1),
        })
    }
}

#[async_trait::async_trait]
impl PermissionDirectory for MongoPermissionDirectory {
    async fn is_member(&self, principal: &str, key: &str) -> Result<bool> {
        let count = self
            .collection
            .count(doc! { "_id": key, "members": principal })
            .await?;
        Ok(count > 0)
    }

    async fn grant(&self, principal: &str, key: &str) -> Result<()> {
        require_key(key)?;
        require_principal(principal)?;

        let now = DateTime::now();
        self.collection
            .upsert_one(
                doc! { "_id": key },
                doc! {
                    "$addToSet": { "members": principal },
                    "$set": { "metadata.updated_at": now },
                    "$setOnInsert": { "metadata.created_at": now },
                },
            )
            .await?;

        info!("Granted permission key {} to {}", key, principal);
        Ok(())
    }

    async fn revoke(&self, principal: &str, key: &str) -> Result<()> {
        require_key(key)?;
        require_principal(principal)?;

        self.collection
            .update_one(
                doc! { "_id": key },
                doc! {
                    "$pull": { "members": principal },
                    "$set": { "metadata.updated_at": DateTime::now() },
                },
            )
            .await?;

        info!("Revoked permission key {} from {}", key, principal);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut filter = PermissionSetDoc::non_empty_filter();
            if let Some(ref last) = after {
                filter.insert("_id", doc! { "$gt": last.as_str() });
            }

            let page = self
                .collection
                .find_page(filter, doc! { "_id": 1 }, self.scan_batch as i64)
                .await?;

            let exhausted = page.len() < self.scan_batch;
            after = page.last().map(|set| set._id.clone());
            keys.extend(page.into_iter().map(|set| set._id));

            debug!("Scanned {} permission keys so far", keys.len());

            if exhausted || after.is_none() {
                break;
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn list_members(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .collection
            .find_one(doc! { "_id": key })
            .await?
            .map(|set| set.members)
            .unwrap_or_default())
    }
}
