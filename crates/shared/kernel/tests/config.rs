use std::fs;
use warren_domain::config::ApiConfig;
use warren_kernel::config::{ConfigError, load_config};

#[test]
fn test_file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warren.toml");
    fs::write(
        &path,
        r#"
[server]
port = 9000

[routing]
root_path = "/api"
head_routes = false
namespacing = true
"#,
    )
    .unwrap();

    let cfg: ApiConfig = load_config(Some(&path)).unwrap();

    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.routing.route("/sample"), "/api/sample");
    assert!(!cfg.routing.head_routes);
    assert!(cfg.routing.options_routes);
    assert!(cfg.routing.namespacing);
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_config::<ApiConfig>(Some(dir.path().join("absent.toml")));

    assert!(matches!(result, Err(ConfigError::Config { context: Some(_), .. })));
}
