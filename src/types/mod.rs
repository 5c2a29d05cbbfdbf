//! Shared types for the table store

pub mod error;
pub mod model;

pub use error::{Result, TableStoreError};
pub use model::{
    validate_period_label, FieldDef, FullTable, NewTable, PeriodIndex, PeriodRows, PeriodView, Row,
    ShardId, Table, TableId, TableSchema, TableSummary,
};
