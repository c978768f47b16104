//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all dispatch handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Route each request to its pipeline via the compiled route table
//! - Spawn the decision logger after the response is final
//! - Observability (metrics, correlation IDs)

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::schema::HandlerKind;
use crate::config::EdgeConfig;
use crate::endpoints::media::MediaPassthrough;
use crate::endpoints::originless;
use crate::gate::TagProxy;
use crate::http::client::{HttpSend, ReqwestClient};
use crate::http::request::{MakeRequestUuid, RequestContext, X_REQUEST_ID};
use crate::http::response;
use crate::observability::{metrics, reporter};
use crate::redirect::RedirectResolver;
use crate::routing::RouteTable;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub resolver: Arc<RedirectResolver>,
    pub gate: Arc<TagProxy>,
    pub media: Arc<MediaPassthrough>,
    pub client: Arc<dyn HttpSend>,
    pub config: Arc<EdgeConfig>,
}

/// HTTP server for the edge gateway.
pub struct HttpServer {
    router: Router,
    config: EdgeConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: EdgeConfig) -> Self {
        let client: Arc<dyn HttpSend> = Arc::new(ReqwestClient::new(Duration::from_secs(5)));

        let routes = Arc::new(RouteTable::from_config(config.routes.clone()));
        let resolver = Arc::new(RedirectResolver::new(
            client.clone(),
            config.decision.clone(),
            config.origin.clone(),
            config.cache.ttl_secs,
        ));
        let gate = Arc::new(TagProxy::new(
            client.clone(),
            config.tag.clone(),
            config.cache.ttl_secs,
        ));
        let media = Arc::new(MediaPassthrough::new(
            client.clone(),
            &config.endpoints,
            config.origin.clone(),
        ));

        let state = AppState {
            routes,
            resolver,
            gate,
            media,
            client,
            config: Arc::new(config.clone()),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, tls = self.config.listener.tls.is_some(), "HTTP server starting");

        match &self.config.listener.tls {
            Some(tls) => {
                let rustls_config = crate::http::tls::load_tls_config(
                    Path::new(&tls.cert_path),
                    Path::new(&tls.key_path),
                )
                .await?;

                let handle = axum_server::Handle::new();
                let shutdown_handle = handle.clone();
                tokio::spawn(async move {
                    shutdown_signal().await;
                    shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
                });

                let std_listener = listener.into_std()?;
                std_listener.set_nonblocking(true)?;
                axum_server::from_tcp_rustls(std_listener, rustls_config)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                axum::serve(listener, self.router)
                    .with_graceful_shutdown(shutdown_signal())
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }
}

/// Main dispatch handler.
/// Matches a route, runs the pipeline, and detaches the decision logger.
async fn dispatch_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> impl IntoResponse {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let route = match state.routes.match_request(&request) {
        Some(route) => (route.name.clone(), route.handler),
        None => {
            tracing::warn!(request_id = %request_id, path = %path, "No route matched");
            metrics::record_request(&method, 404, "none", start_time);
            return (StatusCode::NOT_FOUND, "No matching route found").into_response();
        }
    };
    let (route_name, handler) = route;

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        route = %route_name,
        "Dispatching request"
    );

    let default_scheme = if state.config.listener.tls.is_some() {
        "https"
    } else {
        "http"
    };
    let ctx = match RequestContext::from_request(request, default_scheme).await {
        Ok(ctx) => ctx,
        Err(err) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %err, "rejecting request body");
            metrics::record_request(&method, 413, &route_name, start_time);
            return response::plain_text(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
                .into_response();
        }
    };

    // The response is always final before the logger is spawned; logging
    // is never on the critical path.
    let response = match handler {
        HandlerKind::Redirect => {
            let outcome = state.resolver.resolve(&ctx).await;
            let record = reporter::LogRecord::from_exchange(&ctx, &outcome.response, outcome.rule_id);
            reporter::report(state.client.clone(), &state.config.decision, record);
            outcome.response
        }
        HandlerKind::TagProxy => {
            let response = state.gate.proxy(&ctx).await;
            let record = reporter::LogRecord::from_exchange(&ctx, &response, None);
            reporter::report(state.client.clone(), &state.config.decision, record);
            response
        }
        HandlerKind::Geo => originless::geo(&ctx),
        HandlerKind::Robots => originless::robots(&state.config.endpoints.sitemap_url),
        HandlerKind::Media => state.media.serve(&ctx).await,
    };

    metrics::record_request(&method, response.status().as_u16(), &route_name, start_time);
    response.into_response()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
