//! # Operations
//!
//! An operation is a named action on a collection. It is declared through an
//! [`OperationBuilder`] and compiled once into an immutable [`Operation`] holding its
//! HTTP method, synthesized path, assembled parameter list and body.
//!
//! Request handling in [`Operation::invoke`] runs, in order:
//! 1. the registration gate,
//! 2. the capability check,
//! 3. input validation,
//! 4. the body.
//!
//! The first stage to refuse the request produces the reply and later stages never run.

use crate::error::DeclarationError;
use crate::feature::Feature;
use crate::hooks::Hooks;
use crate::path;
use crate::reply::{Control, ControlError, Inputs, Reply};
use crate::validator;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use warren_domain::method::{Convention, HttpMethod, Scope, convention_for, implies_id};
use warren_domain::param::ParameterSchema;

pub const PRECONDITION_FAILED: u16 = 412;
pub const NOT_FOUND: u16 = 404;
pub const EXPECT: &str = "expect";
pub const MISSING_CAPABILITY: &str = "The required capability to execute this operation is missing";

/// Decides whether an operation is bound at all, and whether it answers at request time.
#[derive(Clone, Default)]
pub enum Gate {
    #[default]
    Always,
    /// The binding is left out of the route table.
    Never,
    /// Evaluated on every request; `false` answers `404`.
    Dynamic(Arc<dyn Fn() -> bool + Send + Sync>),
}

impl Gate {
    pub fn dynamic<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(predicate))
    }

    /// Whether the compiler should emit a binding.
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        !matches!(self, Self::Never)
    }

    /// Whether a request may proceed right now.
    #[must_use]
    pub fn is_open(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Dynamic(predicate) => predicate(),
        }
    }
}

impl From<bool> for Gate {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Always } else { Self::Never }
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Never => f.write_str("Never"),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Declaration-time state of one operation.
#[derive(Debug)]
pub struct OperationBuilder {
    name: String,
    description: Option<String>,
    method: Option<HttpMethod>,
    default_method: Option<HttpMethod>,
    collection_level: bool,
    params: Vec<ParameterSchema>,
    capability: Option<String>,
    gate: Gate,
    control: Option<Control>,
    errors: Vec<DeclarationError>,
}

impl OperationBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            method: None,
            default_method: None,
            collection_level: false,
            params: Vec::new(),
            capability: None,
            gate: Gate::Always,
            control: None,
            errors: Vec::new(),
        }
    }

    /// An action: a custom operation whose method defaults to `POST`.
    pub(crate) fn action(name: impl Into<String>) -> Self {
        let mut builder = Self::new(name);
        builder.default_method = Some(HttpMethod::Post);
        builder
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&mut self, text: impl Into<String>) -> &mut Self {
        self.description = Some(text.into());
        self
    }

    /// Declares one parameter. Declaring the same name twice is a configuration error.
    pub fn param(&mut self, schema: ParameterSchema) -> &mut Self {
        if self.params.iter().any(|p| p.name() == schema.name()) {
            self.errors.push(DeclarationError::DuplicateParameter {
                message: format!("'{}' on operation '{}'", schema.name(), self.name).into(),
                context: None,
            });
        } else {
            self.params.push(schema);
        }
        self
    }

    pub fn params<I>(&mut self, schemas: I) -> &mut Self
    where
        I: IntoIterator<Item = ParameterSchema>,
    {
        for schema in schemas {
            self.param(schema);
        }
        self
    }

    /// Overrides the conventional HTTP method.
    pub const fn http_method(&mut self, method: HttpMethod) -> &mut Self {
        self.method = Some(method);
        self
    }

    /// Drops the id segment of a custom operation so it acts on the whole collection.
    pub const fn collection_level(&mut self) -> &mut Self {
        self.collection_level = true;
        self
    }

    pub fn with_capability(&mut self, capability: impl Into<String>) -> &mut Self {
        self.capability = Some(capability.into());
        self
    }

    pub fn when(&mut self, gate: impl Into<Gate>) -> &mut Self {
        self.gate = gate.into();
        self
    }

    pub fn control<F, Fut>(&mut self, body: F) -> &mut Self
    where
        F: Fn(Inputs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, ControlError>> + Send + 'static,
    {
        self.control = Some(Control::new(body));
        self
    }

    fn convention(&self) -> Convention {
        let mut convention = convention_for(&self.name);
        if !convention.canonical {
            if self.collection_level {
                convention.scope = Scope::Collection;
            }
            if let Some(method) = self.default_method {
                convention.method = method;
            }
        }
        if let Some(method) = self.method {
            convention.method = method;
        }
        convention
    }

    /// Compiles the declaration against its owning collection.
    pub(crate) fn build(
        self,
        owner: &OperationOwner<'_>,
        hooks: &Hooks,
    ) -> Result<Operation, DeclarationError> {
        let convention = self.convention();
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        let mut params = Vec::with_capacity(self.params.len() + 1);
        if implies_id(&self.name) && !self.params.iter().any(|p| p.name() == owner.id_param) {
            params.push(
                ParameterSchema::string(owner.id_param)
                    .required()
                    .describe(format!("The {} parameter", owner.id_param)),
            );
        }
        params.extend(self.params);

        let mut features = Vec::new();
        for feature in owner.features.iter().filter(|f| hooks.feature_enabled(owner.name, f.name()))
        {
            let Some(extension) = feature.operation(&self.name) else { continue };
            for schema in extension.params() {
                if params.iter().any(|p| p.name() == schema.name()) {
                    tracing::warn!(
                        feature = feature.name(),
                        collection = owner.name,
                        operation = %self.name,
                        param = schema.name(),
                        "Feature parameter shadows an existing one, skipping"
                    );
                    continue;
                }
                params.push(schema.clone());
            }
            features.push(feature.name().to_owned());
        }

        let relative = path::operation_path(
            owner.path,
            owner.id_param,
            &self.name,
            convention.scope,
            convention.canonical,
        );
        path::check_unambiguous(&relative)?;
        let aux_relative = path::join(owner.path, &self.name);

        let description = self.description.unwrap_or_else(|| {
            format!("{} operation on {} collection", capitalize(&self.name), owner.name)
        });

        Ok(Operation {
            path: owner.routing.route(&relative),
            aux_path: owner.routing.route(&aux_relative),
            name: self.name,
            collection: owner.name.to_owned(),
            description,
            method: convention.method,
            scope: convention.scope,
            params,
            required_capability: self.capability,
            gate: self.gate,
            features,
            control: self.control.unwrap_or_else(Control::empty),
        })
    }
}

/// What an operation needs to know about the collection compiling it.
pub(crate) struct OperationOwner<'a> {
    pub(crate) name: &'a str,
    /// Path relative to the routing root.
    pub(crate) path: &'a str,
    pub(crate) id_param: &'a str,
    pub(crate) features: &'a [Feature],
    pub(crate) routing: &'a warren_domain::config::RoutingConfig,
}

/// A compiled, immutable operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    name: String,
    collection: String,
    description: String,
    method: HttpMethod,
    scope: Scope,
    path: String,
    #[serde(skip)]
    aux_path: String,
    params: Vec<ParameterSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required_capability: Option<String>,
    #[serde(skip)]
    gate: Gate,
    features: Vec<String>,
    #[serde(skip)]
    control: Control,
}

impl Operation {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning collection.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// Full path, root prefix included.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path of the `HEAD` and `OPTIONS` bindings describing this operation.
    #[must_use]
    pub fn aux_path(&self) -> &str {
        &self.aux_path
    }

    #[must_use]
    pub fn params(&self) -> &[ParameterSchema] {
        &self.params
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParameterSchema> {
        self.params.iter().find(|p| p.name() == name)
    }

    #[must_use]
    pub fn required_capability(&self) -> Option<&str> {
        self.required_capability.as_deref()
    }

    #[must_use]
    pub const fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Names of the features that injected parameters into this operation.
    #[must_use]
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// `Allow` value of the operation's `OPTIONS` binding: its parameter descriptors.
    #[must_use]
    pub fn allow_header(&self) -> String {
        self.params.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
    }

    /// Handles one request.
    ///
    /// # Errors
    /// Errors raised by the operation body are returned untouched.
    pub async fn invoke(&self, inputs: Inputs, hooks: &Hooks) -> Result<Reply, ControlError> {
        if let Some(reply) = self.precheck(&inputs, hooks) {
            return Ok(reply);
        }
        self.control.call(inputs).await
    }

    fn precheck(&self, inputs: &Inputs, hooks: &Hooks) -> Option<Reply> {
        if !self.gate.is_open() {
            tracing::debug!(operation = %self.name, collection = %self.collection, "Operation disabled");
            return Some(Reply::text(
                NOT_FOUND,
                format!("Operation '{}' is not available", self.name),
            ));
        }

        if let Some(capability) = self.required_capability.as_deref()
            && !hooks.capability_granted(capability)
        {
            tracing::debug!(operation = %self.name, capability, "Required capability missing");
            return Some(
                Reply::text(PRECONDITION_FAILED, MISSING_CAPABILITY).with_header(EXPECT, capability),
            );
        }

        if let Err(err) = validator::validate(inputs, &self.params) {
            tracing::debug!(operation = %self.name, error = %err, "Validation failed");
            return Some(Reply::text(err.http_status(), err.to_string()));
        }

        None
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}
