// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server implementation module
//!
//! This module provides the main server struct for the asset import service,
//! including storage setup, router configuration, and coordinated graceful
//! shutdown using `CancellationToken`.

use std::{future::IntoFuture, net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, http::HeaderName};
use external_apis::{DirectImporter, ProviderRegistry, ResponseCache};
use hyper::Request;
use media_pool::{Downloader, DownloaderConfig, MediaPool};
use tokio::{net::TcpListener, task::JoinHandle, time::timeout};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{debug, error, info, info_span, warn};

use crate::{
    config::ServerConfig,
    error::{ServerError, ServerResult},
    middleware::RateLimiter,
    routes::create_routes,
    state::ServerState,
};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_FORCE_SHUTDOWN_TIMEOUT_SECONDS: u64 = 5;
const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Configuration for server shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Maximum time in-flight requests get to finish after shutdown starts
    pub graceful_timeout: Duration,
    /// Maximum time background tasks get to stop after the server finished
    pub force_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS),
            force_timeout: Duration::from_secs(DEFAULT_FORCE_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Main server struct
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    router: Router,
    state: ServerState,
    cancellation_token: CancellationToken,
    shutdown_config: ShutdownConfig,
}

impl Server {
    /// Create new server instance
    ///
    /// Opens the database, applies the media pool and cache migrations,
    /// prepares the media directory and registers the configured providers.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Storage` if the database or the media directory
    /// cannot be set up.
    pub async fn new(config: ServerConfig, shutdown_config: ShutdownConfig) -> ServerResult<Self> {
        let db = media_pool::connect_database(&config.database_url).await?;
        media_pool::run_migrations(&db).await?;
        external_apis::run_migrations(&db).await?;

        let media_pool = MediaPool::new(db.clone(), &config.media_dir).await?;
        let cache = ResponseCache::new(db, config.cache_ttl_hours.value());
        let registry = ProviderRegistry::from_config(&config.providers, Some(cache));

        info!(
            providers = ?registry.list(),
            media_dir = %config.media_dir.display(),
            "storage ready"
        );

        Self::with_registry(config, shutdown_config, media_pool, Arc::new(registry))
    }

    /// Create server with a prepared media pool and provider registry
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Storage` if the HTTP clients for downloads
    /// cannot be created.
    pub fn with_registry(
        config: ServerConfig,
        shutdown_config: ShutdownConfig,
        media_pool: MediaPool,
        registry: Arc<ProviderRegistry>,
    ) -> ServerResult<Self> {
        let downloader = Downloader::new(DownloaderConfig::default())?;
        let direct_importer = DirectImporter::new(DownloaderConfig {
            user_agent: config.direct_import.user_agent.clone(),
            timeout_seconds: config.direct_import.timeout_seconds.value().as_secs(),
        })?;

        let cancellation_token = CancellationToken::new();
        let state = ServerState::new(
            config.clone(),
            registry,
            media_pool,
            downloader,
            direct_importer,
            cancellation_token.child_token(),
        );
        let router = Self::create_router(state.clone());

        Ok(Self {
            config,
            router,
            state,
            cancellation_token,
            shutdown_config,
        })
    }

    /// Create application router with middleware
    fn create_router(state: ServerState) -> Router {
        let timeout_duration = state.config().timeout_seconds.value();
        let rate_limiter = RateLimiter::new(state.config().rate_limiting.clone());

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                    if let Some(request_id) = req.headers().get(REQUEST_ID_HEADER) {
                        info_span!("http_request", ?request_id, method = %req.method(), uri = %req.uri())
                    } else {
                        error!("failed to extract id from request");
                        info_span!("http_request", request_id = "unknown")
                    }
                }),
            )
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(CorsLayer::permissive())
            .layer(TimeoutLayer::new(timeout_duration));

        create_routes(&state, rate_limiter)
            .layer(middleware)
            .with_state(state)
    }

    /// Periodically purge expired cache rows until cancelled
    fn spawn_cache_maintenance(&self) -> Option<JoinHandle<()>> {
        let cache = self.state.registry().cache()?.clone();
        let token = self.cancellation_token.child_token();

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(CACHE_CLEANUP_INTERVAL);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = interval.tick() => match cache.cleanup_expired().await {
                        Ok(deleted) => debug!(deleted, "cache maintenance finished"),
                        Err(e) => warn!(error = %e, "cache maintenance failed"),
                    },
                }
            }
        }))
    }

    async fn bind(&self) -> ServerResult<(TcpListener, SocketAddr)> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;

        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;

        Ok((listener, actual_addr))
    }

    /// Run the server with coordinated graceful shutdown
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address,
    /// or `ServerError::Shutdown` if the server fails while serving.
    pub async fn run(self) -> ServerResult<()> {
        let (listener, actual_addr) = self.bind().await?;

        info!(
            address = %actual_addr,
            environment = %self.config.environment,
            "asset import server starting",
        );

        let cancellation_token = self.cancellation_token.clone();
        let signal_token = cancellation_token.clone();
        tokio::spawn(async move {
            info!("spawning the graceful shutdown task");
            Self::shutdown_signal_handler(signal_token).await;
        });

        let maintenance = self.spawn_cache_maintenance();

        let serve_token = cancellation_token.clone();
        let serve = axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { serve_token.cancelled().await });
        let mut server = tokio::spawn(serve.into_future());

        let server_result = tokio::select! {
            result = &mut server => result?,
            () = cancellation_token.cancelled() => {
                match timeout(self.shutdown_config.graceful_timeout, &mut server).await {
                    Ok(result) => result?,
                    Err(_) => {
                        warn!(
                            timeout = ?self.shutdown_config.graceful_timeout,
                            "in-flight requests did not finish in time, aborting"
                        );
                        server.abort();
                        Ok(())
                    }
                }
            }
        };

        cancellation_token.cancel();
        if let Some(task) = maintenance
            && timeout(self.shutdown_config.force_timeout, task).await.is_err()
        {
            warn!("cache maintenance task did not stop in time");
        }

        match server_result {
            Ok(()) => {
                info!("asset import server shut down gracefully");
                Ok(())
            }
            Err(e) => {
                error!(error = ?e, "Server error during shutdown");
                Err(ServerError::Shutdown { source: e })
            }
        }
    }

    /// Handle shutdown signals and trigger coordinated cancellation
    ///
    /// Listens for SIGINT (Ctrl+C) and SIGTERM and cancels the token when
    /// either arrives.
    async fn shutdown_signal_handler(cancellation_token: CancellationToken) {
        let signal_received = async {
            #[cfg(unix)]
            #[allow(clippy::expect_used)]
            {
                use tokio::signal::unix::{SignalKind, signal};

                let mut sigterm =
                    signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
                let mut sigint =
                    signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

                tokio::select! {
                    _ = sigterm.recv() => "SIGTERM",
                    _ = sigint.recv() => "SIGINT",
                }
            }

            #[cfg(not(unix))]
            #[allow(clippy::expect_used)]
            {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install CTRL+C signal handler");
                "CTRL+C"
            }
        };

        tokio::select! {
            signal_name = signal_received => {
                warn!(signal = signal_name, "shutdown signal received, cancelling all operations");
                cancellation_token.cancel();
            },
            () = cancellation_token.cancelled() => {
                debug!("cancellation token already cancelled, shutdown signal handler exiting");
            }
        }
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Initiates graceful shutdown by cancelling the server's cancellation token
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Run server for testing, returns the bound address
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address.
    pub async fn run_for_testing(self) -> ServerResult<(SocketAddr, CancellationToken)> {
        let (listener, actual_addr) = self.bind().await?;

        let token = self.cancellation_token.child_token();
        let task = token.child_token();
        tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                self.router
                    .into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move { task.cancelled().await })
            .await;
        });

        Ok((actual_addr, token))
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get server state
    pub fn state(&self) -> &ServerState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[tokio::test]
    async fn server_creation() -> ServerResult<()> {
        let config = ServerConfig::for_testing();
        let media_dir = config.media_dir.clone();
        let server = Server::new(config, ShutdownConfig::default()).await?;

        assert_eq!(server.config().environment, Environment::Testing);
        assert!(!server.cancellation_token().is_cancelled());
        assert!(media_dir.is_dir());
        assert_eq!(
            server.state().registry().list(),
            ["pexels", "pixabay", "unsplash", "wikimedia"]
        );
        assert!(server.state().registry().cache().is_some());
        Ok(())
    }

    #[tokio::test]
    async fn programmatic_shutdown() -> ServerResult<()> {
        let server = Server::new(ServerConfig::for_testing(), ShutdownConfig::default()).await?;

        assert!(!server.cancellation_token().is_cancelled());
        server.shutdown();
        assert!(server.cancellation_token().is_cancelled());
        assert!(server.state().cancellation_token.is_cancelled());
        Ok(())
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() -> ServerResult<()> {
        let server = Server::new(ServerConfig::for_testing(), ShutdownConfig::default()).await?;
        let token = server.cancellation_token();

        let handle = tokio::spawn(server.run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        timeout(Duration::from_secs(5), handle)
            .await
            .expect("server did not stop")??;
        Ok(())
    }

    #[test]
    fn shutdown_config_default() {
        let config = ShutdownConfig::default();
        assert_eq!(
            config.graceful_timeout,
            Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS)
        );
        assert_eq!(
            config.force_timeout,
            Duration::from_secs(DEFAULT_FORCE_SHUTDOWN_TIMEOUT_SECONDS)
        );
    }
}
