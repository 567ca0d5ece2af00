//! Web layer module
//!
//! Thin handlers over [`PreviewService`]: the `/fill` endpoint serves image
//! bytes, the health and cache endpoints use the JSON [`ApiResponse`]
//! envelope.

use anyhow::Result;
use axum::{
    Router,
    routing::get,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{config::Config, services::PreviewService};

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod responses;

pub use extractors::RequestContext;
pub use responses::ApiResponse;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub preview_service: Arc<PreviewService>,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: Arc<Config>, preview_service: Arc<PreviewService>) -> Self {
        Self {
            config,
            preview_service,
            start_time: chrono::Utc::now(),
        }
    }
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
    drain_timeout: Duration,
}

impl WebServer {
    pub fn new(state: AppState) -> Result<Self> {
        let addr: SocketAddr = state.config.bind_address().parse()?;
        let drain_timeout = state.config.web.request_timeout;

        Ok(Self {
            app: Self::create_router(state),
            addr,
            drain_timeout,
        })
    }

    /// Create the router with all routes and middleware
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health::health_check))
            .route("/ready", get(handlers::health::readiness_check))
            .route("/live", get(handlers::health::liveness_check))
            .route(
                "/api/v1/cache",
                get(handlers::cache::cache_stats).delete(handlers::cache::clear_cache),
            )
            .route("/fill/{width}/{height}", get(handlers::fill::fill_missing_source))
            .route("/fill/{width}/{height}/{*url}", get(handlers::fill::fill_preview))
            .layer(axum::middleware::from_fn(
                middleware::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until `cancellation_token` fires.
    ///
    /// `ready_signal` receives the bound address once the listener is up, or
    /// the bind error. After cancellation, in-flight requests get the request
    /// timeout to finish before the server stops waiting for them.
    pub async fn serve_with_cancellation(
        self,
        ready_signal: oneshot::Sender<Result<SocketAddr>>,
        cancellation_token: CancellationToken,
    ) -> Result<()> {
        let listener = match tokio::net::TcpListener::bind(&self.addr).await {
            Ok(listener) => listener,
            Err(bind_error) => {
                let bind_err_msg = format!("Failed to bind to {}: {}", self.addr, bind_error);
                let _ = ready_signal.send(Err(anyhow::anyhow!("{}", bind_err_msg)));
                return Err(anyhow::anyhow!("{}", bind_err_msg));
            }
        };

        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, "Image previewer listening");
        let _ = ready_signal.send(Ok(local_addr));

        let shutdown_token = cancellation_token.clone();
        let server = axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
                info!("Web server received cancellation signal, shutting down gracefully");
            })
            .into_future();

        let drain_timeout = self.drain_timeout;
        let drain_deadline = async {
            cancellation_token.cancelled().await;
            tokio::time::sleep(drain_timeout).await;
        };

        tokio::select! {
            result = server => result?,
            _ = drain_deadline => {
                warn!(
                    timeout_ms = drain_timeout.as_millis(),
                    "In-flight requests did not finish before the shutdown deadline"
                );
            }
        }

        Ok(())
    }
}

/// Resolves on SIGTERM or SIGINT
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                    _ = sigint.recv() => info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
                }
            }
            _ => {
                warn!("Failed to install unix signal handlers, falling back to Ctrl+C");
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Received Ctrl+C, shutting down gracefully");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully");
        }
    }
}
