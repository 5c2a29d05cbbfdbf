//! Configuration for Tabula
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::service::FanoutConfig;

/// Tabula - period-sharded table store with permission-gated access
#[derive(Parser, Debug, Clone)]
#[command(name = "tabula")]
#[command(about = "Period-sharded table store with permission-gated access")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (in-memory fallback, dev JWT secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "ec-century")]
    pub mongodb_db: String,

    /// JWT secret for token verification (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum concurrent shard fetches per full-table read
    #[arg(long, env = "FANOUT_LIMIT", default_value = "16")]
    pub fanout_limit: usize,

    /// Deadline for a full-table read in milliseconds (0 disables)
    #[arg(long, env = "FANOUT_TIMEOUT_MS", default_value = "10000")]
    pub fanout_timeout_ms: u64,

    /// Page size used when listing permission keys
    #[arg(long, env = "PERMISSION_SCAN_BATCH", default_value = "100")]
    pub permission_scan_batch: usize,

    /// Seconds to wait for in-flight connections on shutdown
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value = "10")]
    pub shutdown_grace_secs: u64,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if let Some(secret) = &self.jwt_secret {
            if secret.len() < 32 {
                return Err("JWT_SECRET must be at least 32 characters".to_string());
            }
        }

        if self.fanout_limit == 0 {
            return Err("FANOUT_LIMIT must be at least 1".to_string());
        }

        if self.permission_scan_batch == 0 {
            return Err("PERMISSION_SCAN_BATCH must be at least 1".to_string());
        }

        Ok(())
    }

    pub fn fanout(&self) -> FanoutConfig {
        FanoutConfig {
            max_concurrent_fetches: self.fanout_limit,
            deadline: match self.fanout_timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
