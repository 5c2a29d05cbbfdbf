//! Tabula - period-sharded table store with permission-gated access
//!
//! A table's rows are partitioned into shards keyed by (year, month). Shards
//! are allocated on first write, and a full-table read fetches every shard
//! concurrently and merges the results into one ordered map.
//!
//! ## Components
//!
//! - **Permissions**: flat membership of principals in named permission sets
//! - **Store**: table catalog and shard store (MongoDB or in-memory)
//! - **Service**: permission-checked table operations and the full-read fan-out
//! - **Routes / Server**: JSON-over-HTTP API with bearer JWT authentication

pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod permissions;
pub mod routes;
pub mod server;
pub mod service;
pub mod store;
pub mod types;

pub use config::Args;
pub use context::StoreContext;
pub use server::{run, AppState};
pub use service::{FanoutConfig, TableService};
pub use types::{Result, TableStoreError};
