//! # Warren Server
//!
//! Demo host for the route compiler: compiles the [`catalog`] API against the loaded
//! [`ApiConfig`], mounts it on `Axum` and serves it over HTTP or HTTPS with graceful shutdown.
//!
//! ## Example
//! ```no_run
//! use warren_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(4583)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

pub mod catalog;

use crate::catalog::Store;
use anyhow::{Context, Result};
use axum::Router;
use axum_server::Handle;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use warren::Api;
use warren::domain::config::{ApiConfig, LoggingConfig};
use warren::prelude::Hooks;
use warren_logger::{ConsoleFormat, FileOutput, Logger, parse_level};

/// Mounts `api` with request tracing.
pub fn app(api: Arc<Api>) -> Router {
    warren::server::router(api).layer(TraceLayer::new_for_http())
}

/// Installs the global subscriber described by `cfg`.
///
/// JSON applies to every enabled output.
///
/// # Errors
/// Returns an error for an unknown level, a bad filter directive, a configuration with no
/// output, or when a subscriber is already installed.
pub fn init_logging(cfg: &LoggingConfig) -> Result<Logger> {
    let mut builder = Logger::builder().name(env!("CARGO_PKG_NAME")).level(parse_level(&cfg.level)?);

    if let Some(filter) = &cfg.filter {
        builder = builder.directive(filter.as_str());
    }
    builder = if cfg.console {
        builder.console(if cfg.json { ConsoleFormat::Json } else { ConsoleFormat::Compact })
    } else {
        builder.without_console()
    };
    if let Some(path) = &cfg.path {
        builder = builder.file(FileOutput::new(path).json(cfg.json));
    }

    builder.init().context("Failed to initialize logging")
}

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: ApiConfig,
    hooks: Hooks,
    store: Option<Store>,
}

impl ServerBuilder {
    pub fn config(mut self, cfg: ApiConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    /// Feature and capability predicates handed to the compiler.
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Serves `store` instead of the seeded demo data.
    pub fn store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    fn validate_ssl_config(&self) -> Result<()> {
        if let Some(ssl) = &self.cfg.server.ssl {
            if !ssl.cert.exists() {
                anyhow::bail!("SSL certificate not found at: {}", ssl.cert.display());
            }
            if !ssl.key.exists() {
                anyhow::bail!("SSL key not found at: {}", ssl.key.display());
            }

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let metadata = ssl.key.metadata()?;
                if metadata.permissions().mode() & 0o077 != 0 {
                    tracing::warn!(
                        "SECURITY: SSL Private Key {} has insecure permissions (should be 600)",
                        ssl.key.display()
                    );
                }
            }
        }
        Ok(())
    }

    /// Validates TLS settings and compiles the catalog route table.
    ///
    /// # Errors
    /// Returns an error if a configured certificate or key is missing, or if the catalog
    /// declarations do not compile under the configured routing switches.
    pub fn build(self) -> Result<Server> {
        self.validate_ssl_config()?;

        let store = self.store.unwrap_or_else(Store::seeded);
        let api = catalog::api(self.cfg.routing.clone(), self.hooks, &store)
            .context("Failed to compile the catalog API")?;

        info!(
            api = api.name(),
            bindings = api.bindings().len(),
            root = %self.cfg.routing.root_path,
            "Catalog ready"
        );

        Ok(Server { cfg: self.cfg, api: Arc::new(api), store })
    }
}

/// A compiled server ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    cfg: ApiConfig,
    api: Arc<Api>,
    store: Store,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    #[must_use]
    pub fn api(&self) -> &Arc<Api> {
        &self.api
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.cfg
    }

    /// The router [`Server::run`] serves.
    pub fn app(&self) -> Router {
        app(Arc::clone(&self.api))
    }

    /// Publishes the API to the process registry and serves it until a shutdown signal.
    ///
    /// # Errors
    /// Returns an error if a collection name is already published, if the address cannot
    /// be bound, or if TLS setup fails.
    pub async fn run(self) -> Result<()> {
        self.api.publish().context("Failed to publish the catalog collections")?;

        let address = SocketAddr::new(self.cfg.server.address, self.cfg.server.port);
        let grace = Duration::from_secs(self.cfg.server.shutdown_grace);

        info!(
            address = %address,
            ssl = self.cfg.server.ssl.is_some(),
            "Starting server"
        );

        let app = self.app();

        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();

        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!(grace_secs = grace.as_secs(), "Shutdown signal received, draining connections");
            shutdown_handle.graceful_shutdown(Some(grace));
        });

        if let Some(ssl_config) = &self.cfg.server.ssl {
            info!("Starting HTTPS server on https://{address}");

            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                &ssl_config.cert,
                &ssl_config.key,
            )
            .await
            .context("Failed to load SSL/TLS certificates")?;

            axum_server::bind_rustls(address, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTPS server failed")?;
        } else {
            info!("Starting HTTP server on http://{address}");

            axum_server::bind(address)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTP server failed")?;
        }

        info!("Server shutdown complete");
        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }

    Ok(())
}
