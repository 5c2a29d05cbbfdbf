//! HTTP route handlers
//!
//! Requests reach the handlers already collected into a [`RouteRequest`], so
//! routing does not depend on the connection type.

pub mod envelope;
pub mod health;
pub mod permissions;
pub mod tables;

use bytes::Bytes;
use hyper::{Method, Response};
use serde::de::DeserializeOwned;

pub use envelope::{error_response, json_response, Envelope, FullBody};

use crate::server::AppState;
use crate::types::{Result, TableStoreError};

/// A request with its body already read
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: Method,
    pub path: String,
    pub auth_header: Option<String>,
    pub body: Bytes,
}

impl RouteRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            auth_header: None,
            body: Bytes::new(),
        }
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.auth_header = Some(format!("Bearer {}", token));
        self
    }

    pub fn json(mut self, body: &serde_json::Value) -> Self {
        self.body = Bytes::from(body.to_string());
        self
    }
}

pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| TableStoreError::BadInput(format!("Invalid request body: {}", e)))
}

/// Route a request and render the outcome, errors included, as an envelope
pub async fn dispatch(state: &AppState, req: RouteRequest) -> Response<FullBody> {
    match route(state, &req).await {
        Ok(response) => response,
        Err(err) => error_response(&err),
    }
}

async fn route(state: &AppState, req: &RouteRequest) -> Result<Response<FullBody>> {
    if req.method == Method::OPTIONS {
        return Ok(envelope::preflight_response());
    }
    if req.method == Method::GET && req.path == "/ping" {
        return Ok(health::ping(state.args.dev_mode));
    }

    let caller = state.jwt.authenticate(req.auth_header.as_deref())?;

    let svc = &state.service;
    let directory = svc.context().permissions.as_ref();
    let segments: Vec<&str> = req.path.trim_matches('/').split('/').collect();

    match (req.method.clone(), segments.as_slice()) {
        (Method::GET, ["checkToken"]) => Ok(health::check_token(&caller)),

        (Method::GET, ["permission_keys"]) => permissions::list_keys(directory).await,
        (Method::GET, ["permission", key]) => permissions::check(directory, &caller, key).await,
        (Method::GET, ["permission", key, "list"]) => {
            permissions::list_members(directory, &caller, key).await
        }
        (Method::POST, ["permission"]) => permissions::grant(directory, &caller, &req.body).await,
        (Method::DELETE, ["permission"]) => {
            permissions::revoke(directory, &caller, &req.body).await
        }

        (Method::GET, ["table"]) => tables::list(svc, &caller).await,
        (Method::POST, ["table"]) => tables::create(svc, &caller, &req.body).await,
        (Method::GET, ["table", "schema"]) => tables::list_schemas(svc, &caller).await,
        (Method::GET, ["table", "schema", id]) => tables::get_schema(svc, &caller, id).await,
        (Method::GET, ["table", id]) => tables::read_full(svc, &caller, id).await,
        (Method::PUT, ["table", id]) => tables::edit_metadata(svc, &caller, id, &req.body).await,
        (Method::PUT, ["table", id, "sort"]) => {
            tables::edit_sort(svc, &caller, id, &req.body).await
        }
        (Method::DELETE, ["table", id]) => tables::delete(svc, &caller, id).await,
        (Method::GET, ["table", id, year, month]) => {
            tables::read_period(svc, &caller, id, year, month).await
        }
        (Method::PUT, ["table", id, year, month]) => {
            tables::write_period(svc, &caller, id, year, month, &req.body).await
        }

        _ => Ok(envelope::not_found_response(&req.path)),
    }
}
