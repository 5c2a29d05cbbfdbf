//! Table catalog: durable table metadata and the period index

use bson::doc;
use tracing::{debug, info};

use crate::db::mongo::set_with_timestamp;
use crate::db::schemas::{fields_to_bson, index_to_bson, TableDoc, TABLE_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{
    FieldDef, NewTable, PeriodIndex, Result, Table, TableId, TableSchema, TableStoreError,
    TableSummary,
};

/// Storage for table metadata
///
/// Listings are ordered by `sort_key` ascending and are NOT filtered by
/// permission; filtering depends on the caller and belongs to the service.
#[async_trait::async_trait]
pub trait TableCatalog: Send + Sync {
    /// Store a new empty table under a fresh id
    async fn create(&self, new: NewTable) -> Result<Table>;

    async fn get(&self, id: TableId) -> Result<Table>;

    async fn list_summaries(&self) -> Result<Vec<TableSummary>>;

    async fn list_schemas(&self) -> Result<Vec<TableSchema>>;

    async fn update_metadata(&self, id: TableId, name: &str, permission_key: &str) -> Result<()>;

    async fn update_sort(&self, id: TableId, sort_key: i64) -> Result<()>;

    /// Replace the field schema and period index as a whole
    async fn update_schema_and_index(
        &self,
        id: TableId,
        fields: &[FieldDef],
        period_index: &PeriodIndex,
    ) -> Result<()>;

    /// Remove the table. Succeeds when the table is already gone.
    async fn delete(&self, id: TableId) -> Result<()>;
}

pub(crate) fn table_not_found(id: TableId) -> TableStoreError {
    TableStoreError::NotFound(format!("table {}", id))
}

/// MongoDB-backed catalog over the `Table` collection
pub struct MongoTableCatalog {
    collection: MongoCollection<TableDoc>,
}

impl MongoTableCatalog {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let collection = mongo.collection::<TableDoc>(TABLE_COLLECTION).await?;
        Ok(Self { collection })
    }

    async fn list_docs(&self, with_fields: bool) -> Result<Vec<TableDoc>> {
        self.collection
            .find_many(
                doc! {},
                doc! { "sort_key": 1, "_id": 1 },
                Some(TableDoc::schema_projection(with_fields)),
            )
            .await
    }

    async fn set_fields(&self, id: TableId, fields: bson::Document) -> Result<()> {
        let result = self
            .collection
            .update_one(doc! { "_id": id.as_object_id() }, set_with_timestamp(fields))
            .await?;

        if result.matched_count == 0 {
            return Err(table_not_found(id));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TableCatalog for MongoTableCatalog {
    async fn create(&self, new: NewTable) -> Result<Table> {
        let id = TableId::new();
        let doc = TableDoc::from_new(id, new);
        self.collection.insert_one(doc.clone()).await?;

        info!("Table {} created with id {}", doc.name, id);
        Ok(Table::from(doc))
    }

    async fn get(&self, id: TableId) -> Result<Table> {
        self.collection
            .find_one(doc! { "_id": id.as_object_id() })
            .await?
            .map(Table::from)
            .ok_or_else(|| table_not_found(id))
    }

    async fn list_summaries(&self) -> Result<Vec<TableSummary>> {
        let docs = self.list_docs(false).await?;
        debug!("Listed {} table summaries", docs.len());
        Ok(docs.into_iter().map(|d| Table::from(d).summary()).collect())
    }

    async fn list_schemas(&self) -> Result<Vec<TableSchema>> {
        let docs = self.list_docs(true).await?;
        Ok(docs.into_iter().map(|d| Table::from(d).schema()).collect())
    }

    async fn update_metadata(&self, id: TableId, name: &str, permission_key: &str) -> Result<()> {
        self.set_fields(id, doc! { "name": name, "perm_key": permission_key })
            .await
    }

    async fn update_sort(&self, id: TableId, sort_key: i64) -> Result<()> {
        self.set_fields(id, doc! { "sort_key": sort_key }).await
    }

    async fn update_schema_and_index(
        &self,
        id: TableId,
        fields: &[FieldDef],
        period_index: &PeriodIndex,
    ) -> Result<()> {
        let fields = fields_to_bson(fields)?;
        let data = index_to_bson(period_index);
        self.set_fields(id, doc! { "fields": fields, "data": data })
            .await
    }

    async fn delete(&self, id: TableId) -> Result<()> {
        let deleted = self
            .collection
            .delete_one(doc! { "_id": id.as_object_id() })
            .await?;

        if deleted == 0 {
            debug!("Table {} already absent on delete", id);
        } else {
            info!("Table {} deleted", id);
        }
        Ok(())
    }
}
