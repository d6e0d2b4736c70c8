use std::net::SocketAddr;

use axum::Router;
use tokio::sync::watch;

use crate::config::GateConfig;
use crate::error::GateError;

/// Standalone HTTP server for a router built with [`build_router`](crate::build_router).
pub struct GateServer {
    addr: SocketAddr,
    router: Router,
    shutdown_rx: watch::Receiver<bool>,
}

impl GateServer {
    #[must_use]
    pub fn new(bind: &str, port: u16, router: Router, shutdown_rx: watch::Receiver<bool>) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("gate server binding to 0.0.0.0, ensure this is intended");
        }

        Self {
            addr,
            router,
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn from_config(
        config: &GateConfig,
        router: Router,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self::new(&config.bind, config.port, router, shutdown_rx)
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until the shutdown channel flips to `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), GateError> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GateError::Bind(self.addr.to_string(), e))?;
        tracing::info!("gate server listening on {}", self.addr);

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow_and_update() {
                    if shutdown_rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                tracing::info!("gate server shutting down");
            })
            .await
            .map_err(|e| GateError::Server(format!("{e}")))?;

        Ok(())
    }
}
