//! Permission endpoints
//!
//! - `GET /permission/{key}` - does the caller hold `key`
//! - `GET /permission/{key}/list` - members of `key` (super user)
//! - `POST /permission` - grant (super user)
//! - `DELETE /permission` - revoke (super user)
//! - `GET /permission_keys` - every key with members

use bytes::Bytes;
use hyper::Response;
use serde::Deserialize;

use super::envelope::{message_response, ok_response, FullBody};
use super::parse_body;
use crate::auth::Caller;
use crate::permissions::PermissionDirectory;
use crate::types::{Result, TableStoreError};

/// Grant / revoke body. `user_id` defaults to the caller.
#[derive(Debug, Deserialize)]
struct PermissionBody {
    #[serde(default)]
    user_id: String,
    key: String,
}

impl PermissionBody {
    fn principal<'a>(&'a self, caller: &'a Caller) -> Result<&'a str> {
        if self.user_id.is_empty() {
            return Ok(&caller.id);
        }
        if !self.user_id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TableStoreError::BadInput(format!(
                "Invalid user_id: {}",
                self.user_id
            )));
        }
        Ok(&self.user_id)
    }
}

fn require_privileged(caller: &Caller) -> Result<()> {
    if caller.is_privileged {
        Ok(())
    } else {
        Err(TableStoreError::Unauthorized("Not super user".into()))
    }
}

pub async fn check(
    directory: &dyn PermissionDirectory,
    caller: &Caller,
    key: &str,
) -> Result<Response<FullBody>> {
    let held = directory.is_member(&caller.id, key).await?;
    Ok(ok_response("", held))
}

pub async fn list_members(
    directory: &dyn PermissionDirectory,
    caller: &Caller,
    key: &str,
) -> Result<Response<FullBody>> {
    require_privileged(caller)?;
    let members = directory.list_members(key).await?;
    Ok(ok_response("Success", members))
}

pub async fn grant(
    directory: &dyn PermissionDirectory,
    caller: &Caller,
    body: &Bytes,
) -> Result<Response<FullBody>> {
    require_privileged(caller)?;
    let request: PermissionBody = parse_body(body)?;
    directory.grant(request.principal(caller)?, &request.key).await?;
    Ok(message_response(&format!("Added permission key {}", request.key)))
}

pub async fn revoke(
    directory: &dyn PermissionDirectory,
    caller: &Caller,
    body: &Bytes,
) -> Result<Response<FullBody>> {
    require_privileged(caller)?;
    let request: PermissionBody = parse_body(body)?;
    directory.revoke(request.principal(caller)?, &request.key).await?;
    Ok(message_response(&format!("Removed permission key {}", request.key)))
}

pub async fn list_keys(directory: &dyn PermissionDirectory) -> Result<Response<FullBody>> {
    let keys = directory.list_keys().await?;
    Ok(ok_response("Successfully get all page permission keys", keys))
}
