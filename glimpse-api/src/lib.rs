//! # Glimpse API Server
//!
//! HTTP front of the Glimpse profile relay.
//!
//! ## Endpoints
//!
//! - `GET /scrape/:username` - Look up a profile (cached for 4 minutes)
//! - `GET /cache/stats` - Cache occupancy
//! - `GET /health` - Liveness probe
//!
//! ## Example
//!
//! ```rust,ignore
//! use glimpse_api::{ApiServer, ApiConfig};
//!
//! let server = ApiServer::new(ApiConfig::from_env())?;
//! server.run(([0, 0, 0, 0], 8000)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod routes;
mod handlers;
mod limiter;
mod state;
mod dto;
mod error;

pub use routes::create_router;
pub use state::{AppState, ApiConfig};
pub use error::{ApiError, PanicHandler};
pub use limiter::ClientLimiter;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use glimpse_cache::Sweeper;
use glimpse_core::error::Result;

/// API server for Glimpse.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a new API server with the given configuration.
    pub fn new(config: ApiConfig) -> Result<Self> {
        Ok(Self {
            state: Arc::new(AppState::new(config)?),
        })
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET])
            .allow_headers(Any);

        let panics = PanicHandler::new(self.state.relay.notifier().clone());

        create_router(self.state.clone())
            .layer(CatchPanicLayer::custom(panics))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address until Ctrl-C.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        self.run_until(addr, shutdown_signal()).await
    }

    /// Runs the server until `shutdown` resolves.
    ///
    /// The cache sweeper and the rate-limiter pruner run for exactly as
    /// long as the server does.
    pub async fn run_until(
        self,
        addr: impl Into<SocketAddr>,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Glimpse API server listening on {}", addr);

        let sweeper = self.state.relay.start_sweeper();
        let pruner = Sweeper::start(
            self.state.limiter.clone(),
            self.state.config.sweep_interval(),
        );
        let app = self.router();

        let served = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await;

        sweeper.stop().await;
        pruner.stop().await;
        info!("Glimpse API server stopped");
        served
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_handler_panic_is_internal_error() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use axum::routing::get;
        use glimpse_core::traits::NotificationSink;
        use glimpse_core::types::Incident;
        use glimpse_relay::Notifier;
        use tokio::sync::mpsc;
        use tower::ServiceExt;

        struct ChannelSink(mpsc::UnboundedSender<Incident>);

        #[async_trait::async_trait]
        impl NotificationSink for ChannelSink {
            async fn deliver(&self, incident: &Incident) -> Result<()> {
                let _ = self.0.send(incident.clone());
                Ok(())
            }
        }

        async fn boom() -> &'static str {
            panic!("kaboom")
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = Notifier::new(Arc::new(ChannelSink(tx)));
        let app: Router = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(PanicHandler::new(notifier)));

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "Internal Server Error");

        let incident = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match incident {
            Incident::Unhandled { detail, .. } => assert!(detail.contains("kaboom")),
            other => panic!("unexpected incident {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let server = ApiServer::new(ApiConfig::default()).unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(server.run_until(([127, 0, 0, 1], 0), async {
            let _ = rx.await;
        }));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
