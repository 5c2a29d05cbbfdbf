//! Permission set document schema
//!
//! One document per permission key, holding the principals granted that key.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for permission sets
pub const PERMISSION_COLLECTION: &str = "Permission";

/// Permission set stored in MongoDB, keyed by the permission name
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PermissionSetDoc {
    /// Permission key
    pub _id: String,

    #[serde(default)]
    pub metadata: Metadata,

    /// Principal ids; maintained with `$addToSet` / `$pull` so it stays a set
    #[serde(default)]
    pub members: Vec<String>,
}

impl PermissionSetDoc {
    /// Filter matching sets that still have at least one member
    pub fn non_empty_filter() -> Document {
        doc! { "members.0": { "$exists": true } }
    }
}

impl IntoIndexes for PermissionSetDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "members": 1 },
            Some(
                IndexOptions::builder()
                    .name("members_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for PermissionSetDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
