use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use warren::domain::config::RoutingConfig;
use warren::prelude::Hooks;
use warren_server::app;
use warren_server::catalog::{self, MANAGE_IMAGES, Store};

fn router_with(routing: RoutingConfig, hooks: Hooks, store: &Store) -> Router {
    app(Arc::new(catalog::api(routing, hooks, store).expect("catalog compiles")))
}

fn router(store: &Store) -> Router {
    router_with(RoutingConfig::default(), Hooks::new(), store)
}

async fn send(router: Router, method: &str, uri: &str, body: Option<(&str, &str)>) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some((content_type, payload)) => {
            request = request.header(header::CONTENT_TYPE, content_type);
            Body::from(payload.to_owned())
        },
        None => Body::empty(),
    };
    router.oneshot(request.body(body).unwrap()).await.unwrap()
}

async fn text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn json(response: Response) -> Value {
    serde_json::from_str(&text(response).await).unwrap()
}

#[tokio::test]
async fn index_lists_seeded_images() {
    let store = Store::seeded();
    let response = send(router(&store), "GET", "/images", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn query_and_feature_params_filter_images() {
    let store = Store::seeded();

    let response = send(router(&store), "GET", "/images?arch=i386", None).await;
    let images = json(response).await;
    assert_eq!(images.as_array().unwrap().len(), 1);
    assert_eq!(images[0]["name"], "debian");

    let response = send(router(&store), "GET", "/images?owner_id=alice", None).await;
    assert_eq!(json(response).await[0]["name"], "fedora");
}

#[tokio::test]
async fn enum_outside_allowed_values_is_bad_request() {
    let store = Store::seeded();
    let response = send(router(&store), "GET", "/images?arch=sparc", None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(text(response).await.contains("'arch'"));
}

#[tokio::test]
async fn member_show_reads_path_id() {
    let store = Store::seeded();
    let id = store.images()[0].id.clone();

    let response = send(router(&store), "GET", &format!("/images/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["id"], id.as_str());

    let response = send(router(&store), "GET", "/images/missing", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_accepts_form_and_json_bodies() {
    let store = Store::seeded();
    let form = ("application/x-www-form-urlencoded", "name=arch&arch=x86_64");
    let response = send(router(&store), "POST", "/images", Some(form)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json(response).await["owner"], "anonymous");

    let body = ("application/json", r#"{"name":"alpine","arch":"i386","owner":"carol"}"#);
    let response = send(router(&store), "POST", "/images", Some(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(store.images().len(), 4);
}

#[tokio::test]
async fn missing_required_body_param_is_bad_request() {
    let store = Store::seeded();
    let form = ("application/x-www-form-urlencoded", "arch=x86_64");
    let response = send(router(&store), "POST", "/images", Some(form)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(text(response).await.contains("'name'"));
    assert_eq!(store.images().len(), 2);
}

#[tokio::test]
async fn missing_capability_is_precondition_failed() {
    let store = Store::seeded();
    let hooks = Hooks::new().with_capability_check(|capability| capability != MANAGE_IMAGES);
    let router = router_with(RoutingConfig::default(), hooks, &store);
    let id = store.images()[0].id.clone();

    let response = send(router, "DELETE", &format!("/images/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    assert_eq!(response.headers()["expect"], MANAGE_IMAGES);
    assert_eq!(store.images().len(), 2);
}

#[tokio::test]
async fn destroy_removes_image() {
    let store = Store::seeded();
    let id = store.images()[0].id.clone();

    let response = send(router(&store), "DELETE", &format!("/images/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(store.image(&id).is_none());
}

#[tokio::test]
async fn collection_options_has_allow_and_empty_body() {
    let store = Store::seeded();
    let response = send(router(&store), "OPTIONS", "/images", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "0");
    let mut allow: Vec<_> =
        response.headers()["allow"].to_str().unwrap().split(',').map(str::to_owned).collect();
    allow.sort_unstable();
    assert_eq!(allow, ["DELETE", "GET", "OPTIONS", "POST"]);
}

#[tokio::test]
async fn operation_options_lists_feature_parameters() {
    let store = Store::seeded();
    let response = send(router(&store), "OPTIONS", "/images/index", None).await;

    let allow = response.headers()["allow"].to_str().unwrap().to_owned();
    assert!(allow.split(',').any(|p| p == "owner_id:string:optional"));
    assert!(allow.split(',').any(|p| p == "arch:enum:optional"));
}

#[tokio::test]
async fn actions_are_member_posts() {
    let store = Store::seeded();
    let id = store.instances()[0].id.clone();

    let response = send(router(&store), "POST", &format!("/instances/{id}/stop"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["state"], "stopped");

    let response = send(router(&store), "GET", &format!("/instances/{id}/stop"), None).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn dynamic_gate_hides_reboot_during_maintenance() {
    let store = Store::seeded();
    let id = store.instances()[0].id.clone();
    let uri = format!("/instances/{id}/reboot");

    let response = send(router(&store), "POST", &uri, None).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    store.set_maintenance(true);
    let response = send(router(&store), "POST", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(text(response).await, "Operation 'reboot' is not available");
}

#[tokio::test]
async fn subcollection_receives_parent_id() {
    let store = Store::seeded();
    let instance = store.instances()[0].clone();

    let response =
        send(router(&store), "GET", &format!("/instances/{}/volumes", instance.id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await[0], instance.volumes[0].as_str());
}

#[tokio::test]
async fn docs_describe_collections_and_operations() {
    let store = Store::seeded();

    let index = json(send(router(&store), "GET", "/docs", None).await).await;
    assert_eq!(index["name"], "catalog");
    assert_eq!(index["collections"].as_array().unwrap().len(), 2);

    let images = json(send(router(&store), "GET", "/docs/images", None).await).await;
    assert_eq!(images["name"], "images");
    assert_eq!(images["path"], "/images");

    let create = json(send(router(&store), "GET", "/docs/images/operations/create", None).await).await;
    assert_eq!(create["method"], "POST");
    assert_eq!(create["requiredCapability"], MANAGE_IMAGES);
}

#[tokio::test]
async fn root_path_and_switches_shape_the_table() {
    let store = Store::seeded();
    let routing = RoutingConfig {
        root_path: "/api".to_owned(),
        doc_routes: false,
        documentation: false,
        options_routes: false,
        ..RoutingConfig::default()
    };

    let response = send(router_with(routing.clone(), Hooks::new(), &store), "GET", "/api/images", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(router_with(routing.clone(), Hooks::new(), &store), "GET", "/images", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(router_with(routing.clone(), Hooks::new(), &store), "GET", "/api/docs/images", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(router_with(routing, Hooks::new(), &store), "HEAD", "/api/images/index", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
