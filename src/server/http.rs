//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo, one task per connection.

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::header::AUTHORIZATION;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::context::StoreContext;
use crate::routes::{self, error_response, FullBody, RouteRequest};
use crate::service::TableService;
use crate::types::{Result, TableStoreError};

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub service: TableService,
    pub jwt: JwtValidator,
}

impl AppState {
    pub fn new(args: Args, ctx: StoreContext) -> Result<Self> {
        let jwt = match &args.jwt_secret {
            Some(secret) => JwtValidator::new(secret.clone())?,
            None if args.dev_mode => JwtValidator::new_dev(),
            None => {
                return Err(TableStoreError::Config(
                    "JWT_SECRET is required in production mode".into(),
                ))
            }
        };
        let service = TableService::new(ctx, args.fanout());

        Ok(Self { args, service, jwt })
    }
}

/// Bind the configured address and serve until Ctrl-C
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Tabula listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - dev JWT secret accepted");
    }

    serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Accept connections until `shutdown` resolves, then drain in-flight
/// connections for up to the configured grace period.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    connections.spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                break;
            }
        }
    }

    drop(listener);

    let grace = state.args.shutdown_grace();
    let drained = tokio::time::timeout(grace, async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        warn!(
            "{} connections still open after {:?}, aborting",
            connections.len(),
            grace
        );
        connections.abort_all();
    }

    info!("Server stopped");
    Ok(())
}

/// Collect the request and hand it to the router
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<FullBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("[{}] Failed to read request body: {}", addr, e);
            return Ok(error_response(&TableStoreError::BadInput(
                "Failed to read request body".into(),
            )));
        }
    };

    debug!("[{}] {} byte body", addr, body.len());

    let request = RouteRequest {
        method,
        path,
        auth_header,
        body,
    };
    Ok(routes::dispatch(&state, request).await)
}
