//! Liveness endpoints
//!
//! - `GET /ping` - unauthenticated liveness probe
//! - `GET /checkToken` - succeeds only with a valid bearer token

use hyper::Response;
use serde::Serialize;

use super::envelope::{ok_response, FullBody};
use crate::auth::Caller;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub dev_mode: bool,
}

pub fn ping(dev_mode: bool) -> Response<FullBody> {
    ok_response(
        "",
        HealthResponse {
            healthy: true,
            version: env!("CARGO_PKG_VERSION"),
            dev_mode,
        },
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    pub user_id: String,
    pub is_super: bool,
}

pub fn check_token(caller: &Caller) -> Response<FullBody> {
    ok_response(
        "",
        TokenStatus {
            user_id: caller.id.clone(),
            is_super: caller.is_privileged,
        },
    )
}
