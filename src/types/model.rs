//! Domain model: tables, shards, period index and the views returned to callers
//!
//! Rows and field definitions are schemaless JSON objects. The store never
//! interprets them, only keeps and returns them verbatim.

use bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::{Result, TableStoreError};

/// One row: field name -> arbitrary value
pub type Row = serde_json::Map<String, serde_json::Value>;

/// One field definition (name, type hint, display options, ...)
pub type FieldDef = serde_json::Map<String, serde_json::Value>;

/// year label -> month label -> shard reference
pub type PeriodIndex = BTreeMap<String, BTreeMap<String, ShardId>>;

/// year label -> month label -> rows, as returned by a full-table read
pub type PeriodRows = BTreeMap<String, BTreeMap<String, Vec<Row>>>;

macro_rules! object_id_newtype {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(ObjectId);

        impl $name {
            /// Generate a fresh identifier
            pub fn new() -> Self {
                Self(ObjectId::new())
            }

            /// Parse a 24-character hex identifier
            pub fn parse(raw: &str) -> Result<Self> {
                ObjectId::parse_str(raw.trim())
                    .map(Self)
                    .map_err(|_| TableStoreError::BadInput(format!("Invalid {}: {}", $what, raw)))
            }

            pub fn as_object_id(&self) -> ObjectId {
                self.0
            }

            pub fn to_hex(&self) -> String {
                self.0.to_hex()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<ObjectId> for $name {
            fn from(oid: ObjectId) -> Self {
                Self(oid)
            }
        }

        impl FromStr for $name {
            type Err = TableStoreError;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

object_id_newtype!(
    /// Table identifier, assigned at creation and immutable
    TableId,
    "table id"
);

object_id_newtype!(
    /// Shard identifier, generated when a period is first written
    ShardId,
    "shard id"
);

/// A table as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: TableId,
    pub name: String,
    #[serde(rename = "permKey")]
    pub permission_key: String,
    pub sort_key: i64,
    pub fields: Vec<FieldDef>,
    #[serde(rename = "data")]
    pub period_index: PeriodIndex,
}

impl Table {
    /// Shard reference for one period, if one has been allocated
    pub fn shard_for(&self, year: &str, month: &str) -> Option<ShardId> {
        self.period_index.get(year)?.get(month).copied()
    }

    /// Every (year, month, shard) triple in the index
    pub fn periods(&self) -> impl Iterator<Item = (&str, &str, ShardId)> + '_ {
        self.period_index.iter().flat_map(|(year, months)| {
            months
                .iter()
                .map(move |(month, shard)| (year.as_str(), month.as_str(), *shard))
        })
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            id: self.id,
            name: self.name.clone(),
            permission_key: self.permission_key.clone(),
            sort_key: self.sort_key,
        }
    }

    pub fn schema(&self) -> TableSchema {
        TableSchema {
            id: self.id,
            name: self.name.clone(),
            permission_key: self.permission_key.clone(),
            sort_key: self.sort_key,
            fields: self.fields.clone(),
        }
    }
}

/// Metadata supplied when creating a table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTable {
    pub name: String,
    #[serde(default, rename = "permKey")]
    pub permission_key: String,
    #[serde(default)]
    pub sort_key: i64,
    #[serde(default)]
    pub fields: Option<Vec<FieldDef>>,
}

impl NewTable {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_permission_key(mut self, key: impl Into<String>) -> Self {
        self.permission_key = key.into();
        self
    }

    pub fn with_sort_key(mut self, sort_key: i64) -> Self {
        self.sort_key = sort_key;
        self
    }
}

/// Listing entry: the table without its schema or data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub id: TableId,
    pub name: String,
    #[serde(rename = "permKey")]
    pub permission_key: String,
    pub sort_key: i64,
}

/// Listing entry including the field schema
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub id: TableId,
    pub name: String,
    #[serde(rename = "permKey")]
    pub permission_key: String,
    pub sort_key: i64,
    pub fields: Vec<FieldDef>,
}

/// A single period of a table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodView {
    pub id: TableId,
    pub name: String,
    #[serde(rename = "permKey")]
    pub permission_key: String,
    pub fields: Vec<FieldDef>,
    pub rows: Vec<Row>,
}

/// Every period of a table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullTable {
    pub id: TableId,
    pub name: String,
    #[serde(rename = "permKey")]
    pub permission_key: String,
    pub fields: Vec<FieldDef>,
    pub data: PeriodRows,
}

/// Check a year or month label before it becomes a document key.
pub fn validate_period_label(label: &str, what: &str) -> Result<()> {
    if label.is_empty() {
        return Err(TableStoreError::BadInput(format!("{} must not be empty", what)));
    }
    if label.contains('.') || label.starts_with('$') || label.contains('\0') {
        return Err(TableStoreError::BadInput(format!(
            "Invalid {} label: {}",
            what, label
        )));
    }
    Ok(())
}
