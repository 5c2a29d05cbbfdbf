//! Database layer
//!
//! MongoDB storage for tables, shards and permission sets.

pub mod mongo;
pub mod schemas;

pub use mongo::{MongoClient, MongoCollection};
pub use schemas::{Metadata, PermissionSetDoc, ShardDoc, TableDoc};
