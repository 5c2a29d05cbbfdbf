//! Table service and the full-table fan-out

pub mod fanout;
pub mod tables;

pub use fanout::{FanoutConfig, DEFAULT_FANOUT_LIMIT, DEFAULT_FANOUT_TIMEOUT};
pub use tables::TableService;
