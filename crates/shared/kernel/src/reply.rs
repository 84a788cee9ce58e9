//! Request inputs, operation bodies and the responses they produce.

use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub const CONTENT_TYPE: &str = "content-type";
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";

/// Flat map of request inputs (path, query and body parameters), sorted by name.
pub type Inputs = BTreeMap<String, String>;

/// Error escaping an operation body. The core never swallows it.
pub type ControlError = Box<dyn std::error::Error + Send + Sync>;

pub type ControlFuture = Pin<Box<dyn Future<Output = Result<Reply, ControlError>> + Send>>;

/// Response produced by an operation body or an auxiliary binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    status: u16,
    headers: Vec<(Cow<'static, str>, String)>,
    body: String,
}

impl Reply {
    /// An empty response with `status`.
    #[must_use]
    pub const fn new(status: u16) -> Self {
        Self { status, headers: Vec::new(), body: String::new() }
    }

    #[must_use]
    pub const fn ok() -> Self {
        Self::new(200)
    }

    /// A plain-text response.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status).with_header(CONTENT_TYPE, TEXT_PLAIN).with_body(body)
    }

    /// A JSON response.
    ///
    /// # Errors
    /// Returns the serializer error when `value` cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_string(value)?;
        Ok(Self::new(status).with_header(CONTENT_TYPE, APPLICATION_JSON).with_body(body))
    }

    /// Adds a header, replacing an existing one with the same (case-insensitive) name.
    #[must_use]
    pub fn with_header(
        mut self,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn headers(&self) -> &[(Cow<'static, str>, String)] {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn into_parts(self) -> (u16, Vec<(Cow<'static, str>, String)>, String) {
        (self.status, self.headers, self.body)
    }
}

impl Default for Reply {
    fn default() -> Self {
        Self::ok()
    }
}

/// The body of an operation: an async function of the validated inputs.
#[derive(Clone)]
pub struct Control(Arc<dyn Fn(Inputs) -> ControlFuture + Send + Sync>);

impl Control {
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: Fn(Inputs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, ControlError>> + Send + 'static,
    {
        Self(Arc::new(move |inputs| Box::pin(body(inputs))))
    }

    /// Body used for operations declared without one: answers `200` with no content.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(|_| async { Ok(Reply::ok()) })
    }

    pub fn call(&self, inputs: Inputs) -> ControlFuture {
        (self.0)(inputs)
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Control(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_replacement_is_case_insensitive() {
        let reply = Reply::text(400, "bad").with_header("Content-Type", "text/html");

        assert_eq!(reply.headers().len(), 1);
        assert_eq!(reply.header("content-type"), Some("text/html"));
        assert_eq!(reply.body(), "bad");
    }

    #[tokio::test]
    async fn test_control_receives_inputs() {
        let control = Control::new(|inputs: Inputs| async move {
            Ok(Reply::text(200, inputs.get("id").cloned().unwrap_or_default()))
        });

        let inputs = Inputs::from([("id".to_owned(), "100".to_owned())]);
        let reply = control.call(inputs).await.expect("body succeeds");
        assert_eq!(reply.body(), "100");
    }
}
