//! In-memory catalog and shard store for development mode and tests

use dashmap::DashMap;
use tracing::{debug, info};

use super::catalog::{table_not_found, TableCatalog};
use super::shards::{shard_not_found, ShardStore};
use crate::types::{
    FieldDef, NewTable, PeriodIndex, Result, Row, ShardId, Table, TableId, TableSchema,
    TableSummary,
};

#[derive(Default)]
pub struct InMemoryTableCatalog {
    tables: DashMap<TableId, Table>,
}

impl InMemoryTableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(&self) -> Vec<Table> {
        let mut tables: Vec<Table> = self.tables.iter().map(|t| t.value().clone()).collect();
        tables.sort_by(|a, b| a.sort_key.cmp(&b.sort_key).then(a.id.cmp(&b.id)));
        tables
    }

    fn modify(&self, id: TableId, apply: impl FnOnce(&mut Table)) -> Result<()> {
        let mut table = self.tables.get_mut(&id).ok_or_else(|| table_not_found(id))?;
        apply(table.value_mut());
        Ok(())
    }
}

#[async_trait::async_trait]
impl TableCatalog for InMemoryTableCatalog {
    async fn create(&self, new: NewTable) -> Result<Table> {
        let table = Table {
            id: TableId::new(),
            name: new.name,
            permission_key: new.permission_key,
            sort_key: new.sort_key,
            fields: new.fields.unwrap_or_default(),
            period_index: PeriodIndex::new(),
        };
        self.tables.insert(table.id, table.clone());

        info!("Table {} created with id {}", table.name, table.id);
        Ok(table)
    }

    async fn get(&self, id: TableId) -> Result<Table> {
        self.tables
            .get(&id)
            .map(|t| t.value().clone())
            .ok_or_else(|| table_not_found(id))
    }

    async fn list_summaries(&self) -> Result<Vec<TableSummary>> {
        Ok(self.sorted().iter().map(Table::summary).collect())
    }

    async fn list_schemas(&self) -> Result<Vec<TableSchema>> {
        Ok(self.sorted().iter().map(Table::schema).collect())
    }

    async fn update_metadata(&self, id: TableId, name: &str, permission_key: &str) -> Result<()> {
        self.modify(id, |table| {
            table.name = name.to_string();
            table.permission_key = permission_key.to_string();
        })
    }

    async fn update_sort(&self, id: TableId, sort_key: i64) -> Result<()> {
        self.modify(id, |table| table.sort_key = sort_key)
    }

    async fn update_schema_and_index(
        &self,
        id: TableId,
        fields: &[FieldDef],
        period_index: &PeriodIndex,
    ) -> Result<()> {
        self.modify(id, |table| {
            table.fields = fields.to_vec();
            table.period_index = period_index.clone();
        })
    }

    async fn delete(&self, id: TableId) -> Result<()> {
        if self.tables.remove(&id).is_some() {
            info!("Table {} deleted", id);
        } else {
            debug!("Table {} already absent on delete", id);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryShardStore {
    shards: DashMap<ShardId, Vec<Row>>,
}

impl InMemoryShardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of shards ever written
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}

#[async_trait::async_trait]
impl ShardStore for InMemoryShardStore {
    async fn get_rows(&self, shard: ShardId) -> Result<Vec<Row>> {
        self.shards
            .get(&shard)
            .map(|rows| rows.value().clone())
            .ok_or_else(|| shard_not_found(shard))
    }

    async fn put_rows(&self, shard: ShardId, rows: &[Row]) -> Result<()> {
        self.shards.insert(shard, rows.to_vec());
        debug!("Stored {} rows in shard {}", rows.len(), shard);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TableStoreError;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_defaults_to_empty() {
        let catalog = InMemoryTableCatalog::new();
        let table = catalog.create(NewTable::named("Budget")).await.unwrap();

        assert!(table.fields.is_empty());
        assert!(table.period_index.is_empty());
        assert_eq!(catalog.get(table.id).await.unwrap(), table);
    }

    #[tokio::test]
    async fn test_summaries_sorted_by_sort_key() {
        let catalog = InMemoryTableCatalog::new();
        catalog.create(NewTable::named("c").with_sort_key(3)).await.unwrap();
        catalog.create(NewTable::named("a").with_sort_key(1)).await.unwrap();
        catalog.create(NewTable::named("b").with_sort_key(2)).await.unwrap();

        let names: Vec<String> = catalog
            .list_summaries()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_updates_on_missing_table_fail() {
        let catalog = InMemoryTableCatalog::new();
        let missing = TableId::new();

        let err = catalog.update_sort(missing, 4).await.unwrap_err();
        assert!(matches!(err, TableStoreError::NotFound(_)));
        assert!(catalog.update_metadata(missing, "x", "").await.is_err());
        assert!(catalog
            .update_schema_and_index(missing, &[], &PeriodIndex::new())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let catalog = InMemoryTableCatalog::new();
        let table = catalog.create(NewTable::named("Budget")).await.unwrap();

        catalog.delete(table.id).await.unwrap();
        catalog.delete(table.id).await.unwrap();
        assert!(catalog.get(table.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_shard_upsert_overwrites() {
        let shards = InMemoryShardStore::new();
        let id = ShardId::new();

        assert!(shards.get_rows(id).await.unwrap_err().is_not_found());

        shards.put_rows(id, &[row(json!({"a": 1})), row(json!({"a": 2}))]).await.unwrap();
        shards.put_rows(id, &[row(json!({"a": 3}))]).await.unwrap();

        let rows = shards.get_rows(id).await.unwrap();
        assert_eq!(rows, vec![row(json!({"a": 3}))]);
        assert_eq!(shards.len(), 1);
    }
}
