//! Table service: permission-checked table CRUD and period reads/writes
//!
//! Every operation follows the same shape: load what the check needs, ask
//! the permission directory, then touch the catalog and shard store.
//! Nothing is cached between calls.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::fanout::{fetch_all_periods, rows_or_empty, FanoutConfig};
use crate::auth::Caller;
use crate::context::StoreContext;
use crate::permissions::is_allowed;
use crate::types::{
    validate_period_label, FieldDef, FullTable, NewTable, PeriodView, Result, Row, ShardId,
    Table, TableId, TableSchema, TableStoreError, TableSummary,
};

pub struct TableService {
    ctx: StoreContext,
    fanout: FanoutConfig,
}

impl TableService {
    pub fn new(ctx: StoreContext, fanout: FanoutConfig) -> Self {
        Self { ctx, fanout }
    }

    pub fn context(&self) -> &StoreContext {
        &self.ctx
    }

    async fn permits(&self, caller: &Caller, permission_key: &str) -> Result<bool> {
        is_allowed(self.ctx.permissions.as_ref(), &caller.id, permission_key).await
    }

    async fn authorize(&self, caller: &Caller, table: &Table) -> Result<()> {
        if self.permits(caller, &table.permission_key).await? {
            return Ok(());
        }
        warn!(
            "User {} denied access to table {} (key {})",
            caller.id, table.id, table.permission_key
        );
        Err(TableStoreError::Forbidden("No permission".into()))
    }

    /// Load a table fresh from the catalog and check the caller against it
    async fn load_authorized(&self, caller: &Caller, id: TableId) -> Result<Table> {
        let table = self.ctx.catalog.get(id).await?;
        self.authorize(caller, &table).await?;
        Ok(table)
    }

    /// Create an empty table. Any authenticated caller may create.
    pub async fn create(&self, caller: &Caller, new: NewTable) -> Result<Table> {
        let table = self.ctx.catalog.create(new).await?;
        info!("User {} created table {} ({})", caller.id, table.name, table.id);
        Ok(table)
    }

    /// Rows of one period. A period without a shard reads as empty.
    pub async fn read_period(
        &self,
        caller: &Caller,
        id: TableId,
        year: &str,
        month: &str,
    ) -> Result<PeriodView> {
        let table = self.load_authorized(caller, id).await?;

        let rows = match table.shard_for(year, month) {
            Some(shard) => rows_or_empty(self.ctx.shards.as_ref(), shard).await?,
            None => {
                debug!("Table {} has no shard for {}/{}", id, year, month);
                Vec::new()
            }
        };

        Ok(PeriodView {
            id: table.id,
            name: table.name,
            permission_key: table.permission_key,
            fields: table.fields,
            rows,
        })
    }

    /// Replace the field schema and the rows of one period.
    ///
    /// The shard reference is allocated on first write and reused after.
    /// The catalog is updated before the rows; if the row write then fails,
    /// the reference stays behind and reads treat it as empty.
    pub async fn write_period(
        &self,
        caller: &Caller,
        id: TableId,
        year: &str,
        month: &str,
        fields: Vec<FieldDef>,
        rows: Vec<Row>,
    ) -> Result<ShardId> {
        validate_period_label(year, "year")?;
        validate_period_label(month, "month")?;

        let mut table = self.load_authorized(caller, id).await?;

        let shard = match table.shard_for(year, month) {
            Some(existing) => existing,
            None => {
                let fresh = ShardId::new();
                table
                    .period_index
                    .entry(year.to_string())
                    .or_default()
                    .insert(month.to_string(), fresh);
                debug!("Allocated shard {} for table {} {}/{}", fresh, id, year, month);
                fresh
            }
        };

        self.ctx
            .catalog
            .update_schema_and_index(id, &fields, &table.period_index)
            .await?;
        self.ctx.shards.put_rows(shard, &rows).await?;

        info!(
            "User {} wrote {} rows to table {} {}/{}",
            caller.id,
            rows.len(),
            id,
            year,
            month
        );
        Ok(shard)
    }

    /// Every period of the table, fetched concurrently
    pub async fn read_full(&self, caller: &Caller, id: TableId) -> Result<FullTable> {
        let table = self.load_authorized(caller, id).await?;
        let data = fetch_all_periods(Arc::clone(&self.ctx.shards), &table, &self.fanout).await?;

        Ok(FullTable {
            id: table.id,
            name: table.name,
            permission_key: table.permission_key,
            fields: table.fields,
            data,
        })
    }

    /// Rename and re-key a table. Checked against the stored key.
    pub async fn edit_metadata(
        &self,
        caller: &Caller,
        id: TableId,
        name: &str,
        permission_key: &str,
    ) -> Result<()> {
        self.load_authorized(caller, id).await?;
        self.ctx.catalog.update_metadata(id, name, permission_key).await?;
        info!("User {} edited table {} metadata", caller.id, id);
        Ok(())
    }

    pub async fn edit_sort(&self, caller: &Caller, id: TableId, sort_key: i64) -> Result<()> {
        self.load_authorized(caller, id).await?;
        self.ctx.catalog.update_sort(id, sort_key).await?;
        info!("User {} set table {} sort to {}", caller.id, id, sort_key);
        Ok(())
    }

    /// Remove the catalog entry. Shards are left in place.
    pub async fn delete(&self, caller: &Caller, id: TableId) -> Result<()> {
        self.load_authorized(caller, id).await?;
        self.ctx.catalog.delete(id).await?;
        info!("User {} deleted table {}", caller.id, id);
        Ok(())
    }

    /// Tables visible to the caller, ascending sort key
    pub async fn list_tables(&self, caller: &Caller) -> Result<Vec<TableSummary>> {
        let all = self.ctx.catalog.list_summaries().await?;
        let mut visible = Vec::with_capacity(all.len());
        for summary in all {
            if self.permits(caller, &summary.permission_key).await? {
                visible.push(summary);
            }
        }
        debug!("User {} sees {} tables", caller.id, visible.len());
        Ok(visible)
    }

    pub async fn list_schemas(&self, caller: &Caller) -> Result<Vec<TableSchema>> {
        let all = self.ctx.catalog.list_schemas().await?;
        let mut visible = Vec::with_capacity(all.len());
        for schema in all {
            if self.permits(caller, &schema.permission_key).await? {
                visible.push(schema);
            }
        }
        Ok(visible)
    }

    pub async fn get_schema(&self, caller: &Caller, id: TableId) -> Result<TableSchema> {
        Ok(self.load_authorized(caller, id).await?.schema())
    }
}
