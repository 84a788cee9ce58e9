use serial_test::serial;
use warren_domain::config::RoutingConfig;
use warren_kernel::prelude::*;
use warren_kernel::registry::{self, Registry};

fn app(name: &str, namespacing: bool) -> Api {
    let routing = RoutingConfig { namespacing, ..RoutingConfig::default() };
    Api::builder(name)
        .routing(routing)
        .collection("images", |c| {
            c.description("Images").operation("index", |_| {});
        })
        .build()
        .unwrap()
}

#[test]
fn test_publish_and_lookup() {
    let registry = Registry::new();
    registry.publish(&app("cloud", false)).unwrap();

    let images = registry.lookup("images").unwrap();
    assert_eq!(images.description(), Some("Images"));
    assert!(registry.lookup("cloud::images").is_none());
}

#[test]
fn test_clash_without_namespacing() {
    let registry = Registry::new();
    registry.publish(&app("cloud", false)).unwrap();

    let err = registry.publish(&app("storage", false)).unwrap_err();
    assert!(matches!(err, DeclarationError::DuplicateCollection { .. }));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_namespacing_scopes_keys() {
    let registry = Registry::new();
    registry.publish(&app("cloud", true)).unwrap();
    registry.publish(&app("storage", true)).unwrap();

    assert_eq!(registry.keys(), ["cloud::images", "storage::images"]);
}

#[test]
#[serial]
fn test_global_registry() {
    registry::global().clear();
    app("cloud", true).publish().unwrap();

    assert!(registry::global().lookup("cloud::images").is_some());
    assert!(app("cloud", true).publish().is_err());

    registry::global().clear();
    assert!(registry::global().is_empty());
}
