//! Table document schema
//!
//! One document per table: display metadata, field schema and the period
//! index pointing at shard documents.

use bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::{null_as_default, Metadata};
use crate::types::{FieldDef, NewTable, PeriodIndex, Result, ShardId, Table, TableId};

/// Collection name for tables
pub const TABLE_COLLECTION: &str = "Table";

/// Table document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TableDoc {
    pub _id: ObjectId,

    #[serde(default)]
    pub metadata: Metadata,

    pub name: String,

    /// Empty means no gating
    #[serde(default)]
    pub perm_key: String,

    #[serde(default)]
    pub sort_key: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<FieldDef>,

    /// year -> month -> shard document id
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: BTreeMap<String, BTreeMap<String, ObjectId>>,
}

impl TableDoc {
    /// Build the document for a newly created table
    pub fn from_new(id: TableId, new: NewTable) -> Self {
        Self {
            _id: id.as_object_id(),
            metadata: Metadata::default(),
            name: new.name,
            perm_key: new.permission_key,
            sort_key: new.sort_key,
            fields: new.fields.unwrap_or_default(),
            data: BTreeMap::new(),
        }
    }

    /// Projection for listings that don't need the period index
    pub fn schema_projection(with_fields: bool) -> Document {
        let mut projection = doc! { "_id": 1, "name": 1, "perm_key": 1, "sort_key": 1 };
        if with_fields {
            projection.insert("fields", 1);
        }
        projection
    }
}

impl From<TableDoc> for Table {
    fn from(doc: TableDoc) -> Self {
        let period_index: PeriodIndex = doc
            .data
            .into_iter()
            .map(|(year, months)| {
                let months = months
                    .into_iter()
                    .map(|(month, oid)| (month, ShardId::from(oid)))
                    .collect();
                (year, months)
            })
            .collect();

        Table {
            id: TableId::from(doc._id),
            name: doc.name,
            permission_key: doc.perm_key,
            sort_key: doc.sort_key,
            fields: doc.fields,
            period_index,
        }
    }
}

/// Encode a period index as the nested `data` document
pub fn index_to_bson(index: &PeriodIndex) -> Document {
    index
        .iter()
        .map(|(year, months)| {
            let months: Document = months
                .iter()
                .map(|(month, shard)| (month.clone(), Bson::ObjectId(shard.as_object_id())))
                .collect();
            (year.clone(), Bson::Document(months))
        })
        .collect()
}

/// Encode field definitions for a `$set`
pub fn fields_to_bson(fields: &[FieldDef]) -> Result<Bson> {
    Ok(bson::to_bson(fields)?)
}

impl IntoIndexes for TableDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "sort_key": 1 },
            Some(
                IndexOptions::builder()
                    .name("sort_key_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for TableDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
