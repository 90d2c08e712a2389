//! # HTTP Server
//!
//! Combines the per-entity routers into one axum application sharing a
//! read-only `AppState`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::auth::JwtManager;
use crate::gate::{Endpoint, GateResult, Gates};
use crate::models::DitKind;
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::request::RequestData;
use crate::store::GraphStore;

use super::auth_routes::auth_routes;
use super::comment_routes::comment_routes;
use super::config::HttpServerConfig;
use super::contact_routes::contact_routes;
use super::dit_routes::dit_routes;
use super::errors::{ApiError, ApiResult};
use super::extract::{Caller, JsonBody, PathParams, QueryData};
use super::message_routes::message_routes;
use super::tag_routes::tag_routes;
use super::user_routes::user_routes;

/// Shared by every handler; nothing in it changes after boot
pub struct AppState {
    pub store: Arc<dyn GraphStore>,
    pub gates: Gates,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(store: Arc<dyn GraphStore>, gates: Gates, jwt: JwtManager) -> Self {
        Self { store, gates, jwt }
    }

    /// Runs the endpoint gate on a request
    pub fn admit(&self, endpoint: Endpoint, request: &RequestData) -> ApiResult<()> {
        match self.gates.get(endpoint).check(request) {
            GateResult::Accept => Ok(()),
            GateResult::Reject(rejection) => {
                debug!(
                    endpoint = endpoint.schema_name(),
                    errors = rejection.len(),
                    "request rejected"
                );
                Err(ApiError::Rejected {
                    endpoint: endpoint.schema_name(),
                    rejection,
                })
            }
        }
    }

    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }
}

/// Assembles the gate input from the decoded request parts
pub fn request_data(caller: &Caller, params: PathParams, query: QueryData, body: JsonBody) -> RequestData {
    RequestData {
        params: params.0,
        query: query.0,
        body: body.into_inner(),
        auth: caller.auth(),
    }
}

/// `{ "data": ... }` with the given status
pub fn data<T: Serialize>(status: StatusCode, value: T) -> Response {
    (status, Json(json!({ "data": value }))).into_response()
}

pub fn created<T: Serialize>(value: T) -> Response {
    data(StatusCode::CREATED, value)
}

pub fn ok<T: Serialize>(value: T) -> Response {
    data(StatusCode::OK, value)
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Decodes the body of a request that already passed its gate
pub fn decode_body<T: DeserializeOwned>(request: &RequestData) -> ApiResult<T> {
    let body = request.body.clone().unwrap_or_else(|| Value::Object(Map::new()));
    serde_json::from_value(body).map_err(|e| ApiError::Malformed(format!("invalid body: {}", e)))
}

/// HTTP server for the ditup API
pub struct ApiServer {
    config: HttpServerConfig,
    router: Router,
}

impl ApiServer {
    pub fn new(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    pub fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
        let cors = if config.allows_any_origin() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(config.origin_headers()))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(auth_routes())
            .merge(user_routes())
            .merge(tag_routes())
            .merge(contact_routes())
            .merge(message_routes())
            .merge(dit_routes(DitKind::Idea))
            .merge(dit_routes(DitKind::Challenge))
            .merge(comment_routes())
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.body_limit_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// The router (for driving requests in tests)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serves until Ctrl+C or SIGTERM
    pub async fn start(self) -> std::io::Result<()> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        let local = listener.local_addr()?.to_string();
        log_event_with_fields(Event::BootComplete, &[("address", local.as_str())]);
        info!("ditapi listening on http://{}", local);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        log_event(Event::ShutdownComplete);
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C"),
            Err(e) => {
                warn!("failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal");
            }
            Err(e) => {
                warn!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log_event(Event::ShutdownStart);
}
