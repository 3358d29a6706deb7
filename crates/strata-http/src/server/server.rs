//! # Server
//!
//! Binds the configured address, mounts the health endpoint and serves a
//! [`PipelineRouter`] until Ctrl+C, SIGTERM or [`Server::shutdown_token`] is
//! cancelled. In-flight requests see cancellation through their context and get
//! `shutdown_timeout` to finish.

use std::future::IntoFuture;
use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::health::health_check_handler;
use super::lifecycle::shutdown_signal;
use crate::config::HttpConfig;
use crate::errors::{HttpError, HttpResult};
use crate::routing::PipelineRouter;

pub struct Server {
    config: HttpConfig,
    shutdown: CancellationToken,
}

impl Server {
    pub fn new(config: HttpConfig) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Cancel this token to stop the server
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Apply body limit, deadline and shutdown token, then mount the health endpoint
    pub fn build_router(&self, router: PipelineRouter) -> Router {
        let mut app = router
            .max_request_size(self.config.max_request_size)
            .request_timeout(self.config.request_timeout())
            .shutdown_token(self.shutdown.clone())
            .into_router()
            .route(&self.config.health_check_path, get(health_check_handler));

        if self.config.enable_tracing {
            app = app.layer(TraceLayer::new_for_http());
        }
        app
    }

    /// Bind the configured address and serve until shutdown
    pub async fn serve(self, router: PipelineRouter) -> HttpResult<()> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HttpError::startup(format!("Failed to bind to {}: {}", addr, e)))?;
        self.serve_on(listener, router).await
    }

    /// Serve on an already bound listener
    pub async fn serve_on(self, listener: TcpListener, router: PipelineRouter) -> HttpResult<()> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| HttpError::startup(format!("Failed to read local address: {}", e)))?;
        let app = self.build_router(router);

        info!(
            addr = %local_addr,
            health = %self.config.health_check_path,
            "server listening"
        );

        let token = self.shutdown.clone();
        let serve = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown_signal(token.clone()))
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => {
                return result.map_err(|e| HttpError::internal(format!("Server error: {}", e)));
            }
            _ = token.cancelled() => {}
        }

        match tokio::time::timeout(self.config.shutdown_timeout(), serve).await {
            Ok(result) => {
                result.map_err(|e| HttpError::shutdown(format!("Server error: {}", e)))?;
                info!("server stopped");
            }
            Err(_) => warn!(
                timeout_secs = self.config.shutdown_timeout_secs,
                "graceful shutdown timed out, dropping open connections"
            ),
        }
        Ok(())
    }
}
