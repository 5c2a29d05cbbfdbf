//! Table catalog and shard store backends

pub mod catalog;
pub mod memory;
pub mod shards;

pub use catalog::{MongoTableCatalog, TableCatalog};
pub use memory::{InMemoryShardStore, InMemoryTableCatalog};
pub use shards::{MongoShardStore, ShardStore};
