//! HTTP route tests
//!
//! Requests go through the dispatcher with real JWTs, so authentication,
//! envelope shape and status mapping are covered without a socket.

mod common;

use clap::Parser;
use http_body_util::BodyExt;
use hyper::{Method, StatusCode};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use common::CountingDirectory;

use tabula::auth::Claims;
use tabula::routes::{dispatch, RouteRequest};
use tabula::store::{InMemoryShardStore, InMemoryTableCatalog};
use tabula::{AppState, Args, StoreContext};

const SECRET: &str = "route-test-secret-that-is-at-least-32-chars";

fn state() -> AppState {
    state_with(StoreContext::in_memory())
}

fn state_with(ctx: StoreContext) -> AppState {
    let args = Args::parse_from(["tabula", "--jwt-secret", SECRET]);
    AppState::new(args, ctx).unwrap()
}

fn token(user_id: &str, is_super: bool) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 3600;
    encode(
        &Header::default(),
        &Claims {
            user_id: user_id.into(),
            is_super,
            exp,
        },
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn call(state: &AppState, req: RouteRequest) -> (StatusCode, Value) {
    let response = dispatch(state, req).await;
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn create_table(state: &AppState, user: &str, body: Value) -> String {
    let (status, value) = call(
        state,
        RouteRequest::new(Method::POST, "/table").bearer(&token(user, false)).json(&body),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", value);
    value["data"]["id"].as_str().unwrap().to_string()
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_ping_needs_no_token() {
    let state = state();
    let (status, value) = call(&state, RouteRequest::new(Method::GET, "/ping")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["healthy"], true);
}

#[tokio::test]
async fn test_missing_or_bad_token_is_401() {
    let state = state();

    let (status, value) = call(&state, RouteRequest::new(Method::GET, "/table")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(value["success"], false);
    assert!(value["data"].is_null());

    let (status, _) = call(
        &state,
        RouteRequest::new(Method::GET, "/table").bearer("not.a.jwt"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_check_token() {
    let state = state();
    let (status, value) = call(
        &state,
        RouteRequest::new(Method::GET, "/checkToken").bearer(&token("abc123", true)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["data"]["userId"], "abc123");
    assert_eq!(value["data"]["isSuper"], true);
}

// =============================================================================
// Tables
// =============================================================================

#[tokio::test]
async fn test_table_lifecycle_over_routes() {
    let state = state();
    let auth = token("u1", false);
    let id = create_table(&state, "u1", json!({"name": "Budget", "sortKey": 2})).await;

    let (status, value) = call(
        &state,
        RouteRequest::new(Method::PUT, format!("/table/{}/2024/03", id))
            .bearer(&auth)
            .json(&json!({
                "fields": [{"name": "amount"}],
                "rows": [{"amount": 10}, {"amount": 20}]
            })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["message"], "Changes saved");

    let (_, value) = call(
        &state,
        RouteRequest::new(Method::GET, format!("/table/{}/2024/03", id)).bearer(&auth),
    )
    .await;
    assert_eq!(value["data"]["rows"], json!([{"amount": 10}, {"amount": 20}]));
    assert_eq!(value["data"]["fields"], json!([{"name": "amount"}]));

    let (_, value) = call(
        &state,
        RouteRequest::new(Method::GET, format!("/table/{}", id)).bearer(&auth),
    )
    .await;
    assert_eq!(value["data"]["data"]["2024"]["03"][1]["amount"], 20);
    assert_eq!(value["data"]["permKey"], "");

    let (_, value) = call(
        &state,
        RouteRequest::new(Method::PUT, format!("/table/{}/sort", id))
            .bearer(&auth)
            .json(&json!({"sortKey": 7})),
    )
    .await;
    assert_eq!(value["message"], "Edited");

    let (_, value) = call(&state, RouteRequest::new(Method::GET, "/table").bearer(&auth)).await;
    assert_eq!(value["data"][0]["sortKey"], 7);

    let (_, value) = call(
        &state,
        RouteRequest::new(Method::GET, format!("/table/schema/{}", id)).bearer(&auth),
    )
    .await;
    assert_eq!(value["data"]["fields"][0]["name"], "amount");

    let (_, value) = call(
        &state,
        RouteRequest::new(Method::DELETE, format!("/table/{}", id)).bearer(&auth),
    )
    .await;
    assert_eq!(value["success"], true);

    let (status, value) = call(
        &state,
        RouteRequest::new(Method::GET, format!("/table/{}", id)).bearer(&auth),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], false);
    assert_eq!(value["message"], "ID does not exist");
}

#[tokio::test]
async fn test_forbidden_table_is_401() {
    let state = state();
    let id = create_table(&state, "u1", json!({"name": "Secret", "permKey": "budget-2024"})).await;

    let (status, value) = call(
        &state,
        RouteRequest::new(Method::GET, format!("/table/{}", id)).bearer(&token("u1", false)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(value["message"], "No permission");

    let (_, value) = call(
        &state,
        RouteRequest::new(Method::GET, "/table/schema").bearer(&token("u1", false)),
    )
    .await;
    assert_eq!(value["data"], json!([]));
}

#[tokio::test]
async fn test_malformed_input_is_400() {
    let state = state();
    let auth = token("u1", false);

    let (status, _) = call(
        &state,
        RouteRequest::new(Method::GET, "/table/not-an-id").bearer(&auth),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &state,
        RouteRequest::new(Method::POST, "/table").bearer(&auth).json(&json!({"permKey": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id = create_table(&state, "u1", json!({"name": "t"})).await;
    let (status, _) = call(
        &state,
        RouteRequest::new(Method::PUT, format!("/table/{}/2024/$bad", id))
            .bearer(&auth)
            .json(&json!({"rows": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let state = state();
    let (status, value) = call(
        &state,
        RouteRequest::new(Method::PATCH, "/table").bearer(&token("u1", false)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(value["success"], false);
}

#[tokio::test]
async fn test_directory_outage_is_500() {
    let directory = Arc::new(CountingDirectory::default());
    let state = state_with(StoreContext::new(
        directory.clone(),
        Arc::new(InMemoryTableCatalog::new()),
        Arc::new(InMemoryShardStore::new()),
    ));
    let id = create_table(&state, "u1", json!({"name": "Keyed", "permKey": "budget-2024"})).await;

    directory.set_unreachable(true);

    for path in [format!("/table/{}", id), "/table".to_string()] {
        let (status, value) = call(
            &state,
            RouteRequest::new(Method::GET, path).bearer(&token("u1", false)),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["success"], false);
        assert_eq!(value["message"], "Server error");
        assert!(value["data"].is_null());
    }
}

// =============================================================================
// Permissions
// =============================================================================

#[tokio::test]
async fn test_permission_admin_requires_super_user() {
    let state = state();
    let (status, value) = call(
        &state,
        RouteRequest::new(Method::POST, "/permission")
            .bearer(&token("u1", false))
            .json(&json!({"key": "budget-2024"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(value["message"], "Not super user");

    let (status, _) = call(
        &state,
        RouteRequest::new(Method::GET, "/permission/budget-2024/list").bearer(&token("u1", false)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_grant_unlocks_table() {
    let state = state();
    let admin = token("aa01", true);
    let user = token("bb02", false);
    let id = create_table(&state, "bb02", json!({"name": "Budget", "permKey": "budget-2024"})).await;

    let (_, value) = call(
        &state,
        RouteRequest::new(Method::GET, "/permission/budget-2024").bearer(&user),
    )
    .await;
    assert_eq!(value["data"], false);

    let (status, value) = call(
        &state,
        RouteRequest::new(Method::POST, "/permission")
            .bearer(&admin)
            .json(&json!({"user_id": "bb02", "key": "budget-2024"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["message"], "Added permission key budget-2024");

    let (_, value) = call(
        &state,
        RouteRequest::new(Method::GET, "/permission/budget-2024").bearer(&user),
    )
    .await;
    assert_eq!(value["data"], true);

    let (status, _) = call(
        &state,
        RouteRequest::new(Method::GET, format!("/table/{}", id)).bearer(&user),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Omitted user_id applies to the caller
    call(
        &state,
        RouteRequest::new(Method::POST, "/permission")
            .bearer(&admin)
            .json(&json!({"key": "audit"})),
    )
    .await;

    let (_, value) = call(
        &state,
        RouteRequest::new(Method::GET, "/permission_keys").bearer(&user),
    )
    .await;
    assert_eq!(value["data"], json!(["audit", "budget-2024"]));

    let (_, value) = call(
        &state,
        RouteRequest::new(Method::GET, "/permission/audit/list").bearer(&admin),
    )
    .await;
    assert_eq!(value["data"], json!(["aa01"]));

    let (_, value) = call(
        &state,
        RouteRequest::new(Method::DELETE, "/permission")
            .bearer(&admin)
            .json(&json!({"user_id": "bb02", "key": "budget-2024"})),
    )
    .await;
    assert_eq!(value["message"], "Removed permission key budget-2024");

    let (status, _) = call(
        &state,
        RouteRequest::new(Method::GET, format!("/table/{}", id)).bearer(&user),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_hex_user_id_rejected() {
    let state = state();
    let (status, _) = call(
        &state,
        RouteRequest::new(Method::POST, "/permission")
            .bearer(&token("aa01", true))
            .json(&json!({"user_id": "not hex!", "key": "k"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
