//! Table endpoints
//!
//! - `GET /table` - tables visible to the caller
//! - `POST /table` - create a table
//! - `GET /table/schema` - schemas visible to the caller
//! - `GET /table/schema/{id}` - one table schema
//! - `GET /table/{id}` - every period of a table
//! - `PUT /table/{id}` - rename / re-key
//! - `PUT /table/{id}/sort` - change display order
//! - `DELETE /table/{id}` - delete (rows are kept)
//! - `GET /table/{id}/{year}/{month}` - one period
//! - `PUT /table/{id}/{year}/{month}` - replace fields and one period's rows

use bytes::Bytes;
use hyper::Response;
use serde::Deserialize;

use super::envelope::{message_response, ok_response, FullBody};
use super::parse_body;
use crate::auth::Caller;
use crate::service::TableService;
use crate::types::{FieldDef, NewTable, Result, Row, TableId};

#[derive(Debug, Deserialize)]
struct EditMetadataBody {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "permKey")]
    permission_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditSortBody {
    sort_key: i64,
}

#[derive(Debug, Deserialize)]
struct WritePeriodBody {
    #[serde(default)]
    fields: Vec<FieldDef>,
    #[serde(default)]
    rows: Vec<Row>,
}

pub async fn list(svc: &TableService, caller: &Caller) -> Result<Response<FullBody>> {
    let tables = svc.list_tables(caller).await?;
    Ok(ok_response("Success", tables))
}

pub async fn create(svc: &TableService, caller: &Caller, body: &Bytes) -> Result<Response<FullBody>> {
    let new: NewTable = parse_body(body)?;
    let table = svc.create(caller, new).await?;
    Ok(ok_response(&format!("Table {} created", table.name), table.summary()))
}

pub async fn list_schemas(svc: &TableService, caller: &Caller) -> Result<Response<FullBody>> {
    let schemas = svc.list_schemas(caller).await?;
    Ok(ok_response("Success", schemas))
}

pub async fn get_schema(svc: &TableService, caller: &Caller, id: &str) -> Result<Response<FullBody>> {
    let schema = svc.get_schema(caller, TableId::parse(id)?).await?;
    Ok(ok_response("Success", schema))
}

pub async fn read_full(svc: &TableService, caller: &Caller, id: &str) -> Result<Response<FullBody>> {
    let table = svc.read_full(caller, TableId::parse(id)?).await?;
    Ok(ok_response("Success", table))
}

pub async fn edit_metadata(
    svc: &TableService,
    caller: &Caller,
    id: &str,
    body: &Bytes,
) -> Result<Response<FullBody>> {
    let id = TableId::parse(id)?;
    let edit: EditMetadataBody = parse_body(body)?;
    svc.edit_metadata(caller, id, &edit.name, &edit.permission_key)
        .await?;
    Ok(message_response("Edited"))
}

pub async fn edit_sort(
    svc: &TableService,
    caller: &Caller,
    id: &str,
    body: &Bytes,
) -> Result<Response<FullBody>> {
    let id = TableId::parse(id)?;
    let edit: EditSortBody = parse_body(body)?;
    svc.edit_sort(caller, id, edit.sort_key).await?;
    Ok(message_response("Edited"))
}

pub async fn delete(svc: &TableService, caller: &Caller, id: &str) -> Result<Response<FullBody>> {
    svc.delete(caller, TableId::parse(id)?).await?;
    Ok(message_response("Successfully deleted table"))
}

pub async fn read_period(
    svc: &TableService,
    caller: &Caller,
    id: &str,
    year: &str,
    month: &str,
) -> Result<Response<FullBody>> {
    let view = svc.read_period(caller, TableId::parse(id)?, year, month).await?;
    Ok(ok_response("Success", view))
}

pub async fn write_period(
    svc: &TableService,
    caller: &Caller,
    id: &str,
    year: &str,
    month: &str,
    body: &Bytes,
) -> Result<Response<FullBody>> {
    let id = TableId::parse(id)?;
    let write: WritePeriodBody = parse_body(body)?;
    svc.write_period(caller, id, year, month, write.fields, write.rows)
        .await?;
    Ok(message_response("Changes saved"))
}
