use crate::routes::AuxRoutes;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Top-level configuration shared by the host application and the route compiler.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub routing: RoutingConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    /// Serve over TLS when present.
    pub ssl: Option<SslConfig>,
    /// Seconds in-flight requests get to finish after a shutdown signal.
    pub shutdown_grace: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Log output settings consumed by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level directive (`trace`, `debug`, `info`, `warn`, `error`, `off`).
    pub level: String,
    /// Extra filter directives, e.g. `warren_kernel=debug,tower_http=info`.
    pub filter: Option<String>,
    pub console: bool,
    /// Directory for rolling log files. File output is disabled when absent.
    pub path: Option<PathBuf>,
    pub json: bool,
}

/// Route compiler switches. Read once before compilation, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Serve the documentation entrypoint listing every top-level collection.
    pub documentation: bool,
    pub head_routes: bool,
    pub options_routes: bool,
    pub doc_routes: bool,
    /// Prefix applied to every generated path.
    pub root_path: String,
    /// Scope registry names per declaring application (`app::collection`).
    pub namespacing: bool,
}

impl RoutingConfig {
    /// Collapses the individual switches into the auxiliary route set.
    #[must_use]
    pub fn aux_routes(&self) -> AuxRoutes {
        let mut routes = AuxRoutes::empty();
        routes.set(AuxRoutes::HEAD, self.head_routes);
        routes.set(AuxRoutes::OPTIONS, self.options_routes);
        routes.set(AuxRoutes::DOCS, self.doc_routes);
        routes.set(AuxRoutes::INDEX, self.documentation);
        routes
    }

    /// Prefixes an absolute path with the configured root.
    ///
    /// ```rust
    /// use warren_domain::config::RoutingConfig;
    ///
    /// let mut cfg = RoutingConfig::default();
    /// assert_eq!(cfg.route("/sample"), "/sample");
    /// cfg.root_path = "/api/".to_owned();
    /// assert_eq!(cfg.route("/sample"), "/api/sample");
    /// ```
    #[must_use]
    pub fn route(&self, path: &str) -> String {
        let root = self.root_path.trim_matches('/');
        let path = path.trim_start_matches('/');
        match (root.is_empty(), path.is_empty()) {
            (true, _) => format!("/{path}"),
            (false, true) => format!("/{root}"),
            (false, false) => format!("/{root}/{path}"),
        }
    }
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 4583,
            ssl: None,
            shutdown_grace: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), filter: None, console: true, path: None, json: false }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            documentation: true,
            head_routes: true,
            options_routes: true,
            doc_routes: true,
            root_path: "/".to_owned(),
            namespacing: false,
        }
    }
}
