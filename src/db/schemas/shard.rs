//! Shard document schema
//!
//! One document per (table, year, month): the rows of that period.

use bson::{oid::ObjectId, Bson, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::{null_as_default, Metadata};
use crate::types::{Result, Row};

/// Collection name for shards
pub const SHARD_COLLECTION: &str = "TableData";

/// Shard document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ShardDoc {
    pub _id: ObjectId,

    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default, deserialize_with = "null_as_default")]
    pub rows: Vec<Row>,
}

impl ShardDoc {
    /// Encode rows for a `$set`
    pub fn rows_to_bson(rows: &[Row]) -> Result<Bson> {
        Ok(bson::to_bson(rows)?)
    }
}

impl IntoIndexes for ShardDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        // Addressed by _id only
        vec![]
    }
}

impl MutMetadata for ShardDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
