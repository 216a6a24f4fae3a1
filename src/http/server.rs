//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all route handlers
//! - Wire up middleware (tracing, request ID, limits, CORS, headers)
//! - Carry the injected handles (database, chain client, Krnl executor)
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - All shared handles live in `AppState`, constructed once in `main`
//!   and cloned per request; no module-level singletons
//! - Error `details` are scrubbed by middleware in production mode so the
//!   envelope shape stays identical across modes

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{MatchedPath, Request};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::blockchain::ChainClient;
use crate::config::AppConfig;
use crate::http::{chain, krnl, users, wallet};
use crate::krnl::KrnlExecutor;
use crate::observability::metrics;
use crate::storage::Database;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub chain: ChainClient,
    pub krnl: KrnlExecutor,
    pub config: Arc<AppConfig>,
}

/// HTTP server for the Klunkaz API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around the injected handles.
    pub fn new(config: AppConfig, db: Database, chain: ChainClient, krnl: KrnlExecutor) -> Self {
        let state = AppState {
            db,
            chain,
            krnl,
            config: Arc::new(config.clone()),
        };

        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all routes and middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/api/health", get(health))
            .route("/api/users", post(users::create_user))
            .route("/api/users/{wallet_address}", get(users::get_user))
            .route(
                "/api/users/{wallet_address}/transactions",
                get(users::list_transactions),
            )
            .route("/api/wallet/{address}/balance", get(wallet::get_balance))
            .route("/api/wallet/verify", post(wallet::verify_signature))
            .route("/api/wallet/transaction", post(wallet::record_transaction))
            .route("/api/blockchain/query/{address}", get(chain::query_address))
            .route(
                "/api/blockchain/contract/{address}",
                get(chain::contract_info),
            )
            .route("/api/blockchain/operation", post(chain::record_operation))
            .route(
                "/api/blockchain/operations/{wallet_address}",
                get(chain::list_operations),
            )
            .route(
                "/api/blockchain/deploy-contract",
                post(chain::estimate_deployment),
            )
            .route("/api/blockchain/network", get(chain::network_info))
            .route(
                "/api/blockchain/transaction/{tx_hash}",
                get(chain::transaction_status),
            )
            .route("/api/krnl/execute", post(krnl::execute_action))
            .route(
                "/api/krnl/interactions/{wallet_address}",
                get(krnl::list_interactions),
            )
            // route_layer: MatchedPath is only set for matched routes
            .route_layer(middleware::from_fn(track_metrics))
            .fallback(not_found)
            .with_state(state);

        if !config.runtime_mode.expose_details() {
            router = router.layer(middleware::from_fn(scrub_error_details));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            // The browser frontend is served from a different origin.
            .layer(CorsLayer::permissive())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Request ID generation (UUID v4), added as early as possible so every
/// log line of a request can carry it.
#[derive(Clone, Copy)]
struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// `GET /api/health` — flat operational probe, the one non-enveloped route.
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "service": "Klunkaz API",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Unmatched routes still answer in the error envelope shape.
async fn not_found(request: Request<Body>) -> impl IntoResponse {
    let body = json!({
        "error": format!("No route for {} {}", request.method(), request.uri().path()),
        "code": "NOT_FOUND",
        "details": {},
        "timestamp": Utc::now().to_rfc3339(),
    });
    (StatusCode::NOT_FOUND, Json(body))
}

/// Record per-request metrics keyed by the matched route pattern.
async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &path, response.status().as_u16(), start);
    response
}

/// Blank the `details` field of JSON error bodies (production mode).
async fn scrub_error_details(request: Request<Body>, next: Next) -> Response {
    let response = next.run(request).await;
    if !response.status().is_client_error() && !response.status().is_server_error() {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);
    if !is_json {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, 1024 * 1024).await {
        Ok(bytes) => bytes,
        Err(_) => return Response::from_parts(parts, Body::empty()),
    };

    match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(mut value) => {
            if let Some(obj) = value.as_object_mut() {
                if obj.contains_key("details") {
                    obj.insert("details".to_string(), json!({}));
                }
            }
            let mut parts = parts;
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(value.to_string()))
        }
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
