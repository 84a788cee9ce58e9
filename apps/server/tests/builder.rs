use std::path::PathBuf;
use warren::domain::config::{ApiConfig, SslConfig};
use warren_server::Server;

#[test]
fn build_compiles_the_catalog() {
    let server = Server::builder().port(8080).build().unwrap();

    assert_eq!(server.config().server.port, 8080);
    assert_eq!(server.api().name(), "catalog");
    assert!(server.api().collection("images").is_some());
    assert_eq!(server.store().images().len(), 2);
}

#[test]
fn missing_certificate_fails_the_build() {
    let mut cfg = ApiConfig::default();
    cfg.server.ssl =
        Some(SslConfig { cert: PathBuf::from("/nonexistent/cert.pem"), key: PathBuf::from("key.pem") });

    let err = Server::builder().config(cfg).build().unwrap_err();
    assert!(err.to_string().contains("SSL certificate not found"));
}
