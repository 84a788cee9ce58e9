//! # axum host adapter
//!
//! Mounts a compiled [`Api`] on an [`axum::Router`]. Each binding becomes one method
//! route; request inputs are gathered from, in increasing precedence:
//! 1. the query string,
//! 2. a form or JSON object body,
//! 3. path parameters.
//!
//! Operation body errors are logged and answered with `500`.

use crate::compiler::{Api, Endpoint};
use crate::reply::{Inputs, Reply};
use axum::Router;
use axum::body::Body;
use axum::extract::{Form, FromRequest, FromRequestParts, Json, Query, RawPathParams, Request};
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, MethodRouter};
use fxhash::FxHashMap;
use std::sync::Arc;
use warren_domain::method::HttpMethod;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const JSON: &str = "application/json";

/// Builds the router serving every binding of `api`.
pub fn router(api: Arc<Api>) -> Router {
    let mut routes: FxHashMap<String, MethodRouter> = FxHashMap::default();
    for binding in api.bindings() {
        let api = Arc::clone(&api);
        let endpoint = binding.endpoint().clone();
        let handler = move |request: Request| async move { dispatch(&api, &endpoint, request).await };

        let route = routes.entry(axum_path(binding.path())).or_default();
        *route = std::mem::take(route).on(method_filter(binding.method()), handler);
    }

    routes.into_iter().fold(Router::new(), |router, (path, route)| router.route(&path, route))
}

/// Rewrites `:name` placeholders into axum's `{name}` captures.
///
/// ```rust
/// use warren_kernel::server::axum_path;
///
/// assert_eq!(axum_path("/sample/:id/subsample/:sub_id"), "/sample/{id}/subsample/{sub_id}");
/// ```
#[must_use]
pub fn axum_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            segment.strip_prefix(':').map_or_else(|| segment.to_owned(), |name| format!("{{{name}}}"))
        })
        .collect::<Vec<_>>()
        .join("/")
}

const fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Put => MethodFilter::PUT,
        HttpMethod::Patch => MethodFilter::PATCH,
        HttpMethod::Delete => MethodFilter::DELETE,
        HttpMethod::Head => MethodFilter::HEAD,
        HttpMethod::Options => MethodFilter::OPTIONS,
    }
}

async fn dispatch(api: &Api, endpoint: &Endpoint, request: Request) -> Response {
    let inputs = match endpoint {
        Endpoint::Operation(_) => match extract_inputs(request).await {
            Ok(inputs) => inputs,
            Err(rejection) => return rejection,
        },
        _ => Inputs::new(),
    };

    match endpoint.respond(inputs, api.hooks()).await {
        Ok(reply) => to_response(reply),
        Err(err) => {
            tracing::error!(error = %err, kind = endpoint.kind(), "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}

async fn extract_inputs(request: Request) -> Result<Inputs, Response> {
    let (mut parts, body) = request.into_parts();
    let mut inputs = Inputs::new();

    if parts.uri.query().is_some() {
        let Query(query) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(IntoResponse::into_response)?;
        inputs.extend(query);
    }

    let path_params = RawPathParams::from_request_parts(&mut parts, &())
        .await
        .map_err(IntoResponse::into_response)?
        .iter()
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .collect::<Vec<_>>();

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let request = Request::from_parts(parts, body);

    if content_type.starts_with(FORM_URLENCODED) {
        let Form(form) = Form::<Vec<(String, String)>>::from_request(request, &())
            .await
            .map_err(IntoResponse::into_response)?;
        inputs.extend(form);
    } else if content_type.starts_with(JSON) {
        let Json(value) = Json::<serde_json::Value>::from_request(request, &())
            .await
            .map_err(IntoResponse::into_response)?;
        if let serde_json::Value::Object(object) = value {
            inputs.extend(object.into_iter().filter_map(|(name, value)| {
                let value = match value {
                    serde_json::Value::Null => return None,
                    serde_json::Value::String(text) => text,
                    other => other.to_string(),
                };
                Some((name, value))
            }));
        }
    }

    inputs.extend(path_params);
    Ok(inputs)
}

fn to_response(reply: Reply) -> Response {
    let (status, headers, body) = reply.into_parts();
    let length = body.len();

    let mut response = Response::new(Body::from(body));
    *response.status_mut() =
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let response_headers = response.headers_mut();
    for (name, value) in headers {
        match (HeaderName::try_from(&*name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                response_headers.insert(name, value);
            },
            _ => tracing::warn!(header = %name, "Dropping invalid response header"),
        }
    }
    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_paths_are_untouched() {
        assert_eq!(axum_path("/sample/index"), "/sample/index");
        assert_eq!(axum_path("/"), "/");
    }

    #[test]
    fn test_reply_headers_are_copied() {
        let response = to_response(Reply::text(412, "missing").with_header("expect", "admin"));

        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
        assert_eq!(response.headers()["expect"], "admin");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "7");
    }
}
