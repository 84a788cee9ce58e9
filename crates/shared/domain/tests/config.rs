use serde_json::json;
use warren_domain::config::{ApiConfig, RoutingConfig, ServerConfig};
use warren_domain::routes::AuxRoutes;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 4583);

    let routing = RoutingConfig::default();
    assert_eq!(routing.root_path, "/");
    assert!(!routing.namespacing);
    assert_eq!(routing.aux_routes(), AuxRoutes::ALL);
}

#[test]
fn api_config_deserializes() {
    let raw = json!({
        "server": { "address": "::", "port": 8080 },
        "routing": { "root_path": "/api", "head_routes": false, "documentation": false }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.routing.root_path, "/api");
    assert!(cfg.routing.options_routes, "unspecified switches keep their default");
    assert_eq!(cfg.routing.aux_routes(), AuxRoutes::OPTIONS | AuxRoutes::DOCS);
    assert_eq!(cfg.routing.route("/sample/:id"), "/api/sample/:id");
}

#[test]
fn root_path_normalization() {
    let cfg = RoutingConfig { root_path: "api".to_owned(), ..RoutingConfig::default() };
    assert_eq!(cfg.route("/docs"), "/api/docs");
    assert_eq!(cfg.route(""), "/api");

    let cfg = RoutingConfig::default();
    assert_eq!(cfg.route(""), "/");
}

#[test]
fn logging_and_tls_sections() {
    let raw = json!({
        "server": { "ssl": { "cert": "certs/server.pem", "key": "certs/server.key" } },
        "logging": { "level": "debug", "json": true }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert!(cfg.server.ssl.is_some());
    assert_eq!(cfg.server.shutdown_grace, 30);
    assert_eq!(cfg.logging.level, "debug");
    assert!(cfg.logging.json);
    assert!(cfg.logging.console);
    assert!(cfg.logging.path.is_none());
}
