//! Database schemas for the table store
//!
//! Defines MongoDB document structures for tables, shards and permission sets.

mod metadata;
mod permission_set;
mod shard;
mod table;

use serde::{Deserialize, Deserializer};

pub use metadata::Metadata;
pub use permission_set::{PermissionSetDoc, PERMISSION_COLLECTION};
pub use shard::{ShardDoc, SHARD_COLLECTION};
pub use table::{fields_to_bson, index_to_bson, TableDoc, TABLE_COLLECTION};

/// Decode an explicit BSON null the same as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
