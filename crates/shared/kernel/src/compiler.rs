//! # Route Compiler
//!
//! [`ApiBuilder`] collects collection and feature declarations, then compiles them in one
//! pass into an immutable [`Api`]: the collection tree plus a flat list of [`Binding`]s
//! that a host dispatcher mounts.
//!
//! Every configuration error surfaces from [`ApiBuilder::build`], before anything is served.
//!
//! ```rust
//! use warren_domain::param::ParameterSchema;
//! use warren_kernel::compiler::Api;
//!
//! let api = Api::builder("sample_app")
//!     .collection("sample", |c| {
//!         c.operation("index", |o| {
//!             o.param(ParameterSchema::string("filter"));
//!         });
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert!(api.bindings().iter().any(|b| b.path() == "/sample"));
//! ```

use crate::collection::{Collection, CollectionBuilder, CompileContext};
use crate::docs::IndexDocument;
use crate::error::DeclarationError;
use crate::feature::{Feature, FeatureBuilder, FeatureRegistry};
use crate::hooks::Hooks;
use crate::operation::Operation;
use crate::path;
use crate::registry::{self, NAMESPACE_SEPARATOR};
use crate::reply::{ControlError, Inputs, Reply};
use fxhash::FxHashSet;
use std::sync::Arc;
use warren_domain::config::RoutingConfig;
use warren_domain::method::HttpMethod;
use warren_domain::routes::{self as aux, AuxRoutes};

pub const ALLOW: &str = "allow";
pub const METHOD_NOT_ALLOWED: u16 = 405;

/// What a binding does when the host dispatches to it.
#[derive(Debug, Clone)]
pub enum Endpoint {
    Operation(Arc<Operation>),
    /// `200` with an empty body.
    Head,
    /// `200` with the given `Allow` value and an empty body.
    Options(String),
    CollectionDocs(Arc<Collection>),
    OperationDocs(Arc<Operation>),
    Index(Arc<IndexDocument>),
}

impl Endpoint {
    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Operation(_) => "operation",
            Self::Head => aux::HEAD,
            Self::Options(_) => aux::OPTIONS,
            Self::CollectionDocs(_) | Self::OperationDocs(_) => aux::DOCS,
            Self::Index(_) => aux::INDEX,
        }
    }

    /// Produces the reply for one request.
    ///
    /// # Errors
    /// Propagates operation body errors and documentation serialization failures.
    pub async fn respond(&self, inputs: Inputs, hooks: &Hooks) -> Result<Reply, ControlError> {
        match self {
            Self::Operation(operation) => operation.invoke(inputs, hooks).await,
            Self::Head => Ok(Reply::ok()),
            Self::Options(allow) => Ok(Reply::ok().with_header(ALLOW, allow.as_str())),
            Self::CollectionDocs(collection) => Ok(Reply::json(200, &**collection)?),
            Self::OperationDocs(operation) => Ok(Reply::json(200, &**operation)?),
            Self::Index(index) => Ok(Reply::json(200, &**index)?),
        }
    }
}

/// One `method + path -> endpoint` entry of the route table.
#[derive(Debug, Clone)]
pub struct Binding {
    method: HttpMethod,
    path: String,
    endpoint: Endpoint,
}

impl Binding {
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path pattern with `:name` placeholders.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

/// Accumulates bindings and rejects any `method + path` shape seen twice.
struct RouteTable {
    aux: AuxRoutes,
    bindings: Vec<Binding>,
    seen: FxHashSet<(HttpMethod, String)>,
}

impl RouteTable {
    fn new(aux: AuxRoutes) -> Self {
        Self { aux, bindings: Vec::new(), seen: FxHashSet::default() }
    }

    fn bind(
        &mut self,
        method: HttpMethod,
        path: &str,
        endpoint: Endpoint,
    ) -> Result<(), DeclarationError> {
        if !self.seen.insert((method, path::route_key(path))) {
            return Err(DeclarationError::RouteConflict {
                message: format!("{method} {path} is bound twice").into(),
                context: Some(format!("binding {}", endpoint.kind()).into()),
            });
        }
        tracing::debug!(%method, path, kind = endpoint.kind(), "Route bound");
        self.bindings.push(Binding { method, path: path.to_owned(), endpoint });
        Ok(())
    }

    fn collection(&mut self, collection: &Arc<Collection>) -> Result<(), DeclarationError> {
        if self.aux.contains(AuxRoutes::HEAD) {
            self.bind(HttpMethod::Head, collection.path(), Endpoint::Head)?;
        }
        if self.aux.contains(AuxRoutes::OPTIONS) {
            let allow = collection.allow_header();
            self.bind(HttpMethod::Options, collection.path(), Endpoint::Options(allow))?;
        }
        if self.aux.contains(AuxRoutes::DOCS) {
            let docs = Endpoint::CollectionDocs(Arc::clone(collection));
            self.bind(HttpMethod::Get, collection.docs_path(), docs)?;
        }

        for operation in collection.operations() {
            if !operation.gate().is_registered() {
                tracing::debug!(
                    collection = collection.name(),
                    operation = operation.name(),
                    "Operation disabled, not bound"
                );
                continue;
            }
            self.operation(collection, operation)?;
        }

        for child in collection.collections() {
            self.collection(child)?;
        }
        Ok(())
    }

    fn operation(
        &mut self,
        collection: &Collection,
        operation: &Arc<Operation>,
    ) -> Result<(), DeclarationError> {
        let endpoint = Endpoint::Operation(Arc::clone(operation));
        self.bind(operation.method(), operation.path(), endpoint)?;

        if self.aux.contains(AuxRoutes::HEAD) {
            self.bind(HttpMethod::Head, operation.aux_path(), Endpoint::Head)?;
        }
        if self.aux.contains(AuxRoutes::OPTIONS) {
            let allow = operation.allow_header();
            self.bind(HttpMethod::Options, operation.aux_path(), Endpoint::Options(allow))?;
        }
        if self.aux.contains(AuxRoutes::DOCS) {
            let docs_path =
                path::join(&path::join(collection.docs_path(), aux::OPERATIONS), operation.name());
            self.bind(HttpMethod::Get, &docs_path, Endpoint::OperationDocs(Arc::clone(operation)))?;
        }
        Ok(())
    }
}

/// Declaration surface of one application.
#[derive(Debug)]
pub struct ApiBuilder {
    name: String,
    routing: RoutingConfig,
    hooks: Hooks,
    features: FeatureRegistry,
    collections: Vec<CollectionBuilder>,
    errors: Vec<DeclarationError>,
}

impl ApiBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routing: RoutingConfig::default(),
            hooks: Hooks::default(),
            features: FeatureRegistry::default(),
            collections: Vec::new(),
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn routing(mut self, routing: RoutingConfig) -> Self {
        self.routing = routing;
        self
    }

    #[must_use]
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    #[must_use]
    pub fn feature_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_feature_check(check);
        self
    }

    #[must_use]
    pub fn capability_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_capability_check(check);
        self
    }

    /// Declares or extends feature `name` targeting `collection`.
    #[must_use]
    pub fn feature<F>(mut self, name: &str, collection: &str, body: F) -> Self
    where
        F: FnOnce(&mut FeatureBuilder<'_>),
    {
        if let Err(err) = self.features.declare(name, collection, body) {
            self.errors.push(err);
        }
        self
    }

    /// Declares a top-level collection.
    #[must_use]
    pub fn collection<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(&mut CollectionBuilder),
    {
        let mut collection = CollectionBuilder::new(name);
        if self.collections.iter().any(|c| c.name() == collection.name()) {
            self.errors.push(DeclarationError::DuplicateCollection {
                message: format!("'{}' already declared", collection.name()).into(),
                context: Some(format!("application '{}'", self.name).into()),
            });
            return self;
        }
        body(&mut collection);
        self.collections.push(collection);
        self
    }

    /// Compiles every declaration into the route table.
    ///
    /// # Errors
    /// Returns the first [`DeclarationError`] found, in declaration order.
    pub fn build(self) -> Result<Api, DeclarationError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        let collections = {
            let context = CompileContext {
                routing: &self.routing,
                hooks: &self.hooks,
                features: &self.features,
            };
            self.collections
                .into_iter()
                .map(|c| c.build(None, &context).map(Arc::new))
                .collect::<Result<Vec<_>, _>>()?
        };

        let aux_routes = self.routing.aux_routes();
        let mut table = RouteTable::new(aux_routes);
        for collection in &collections {
            table.collection(collection)?;
        }
        if aux_routes.contains(AuxRoutes::INDEX) {
            let index = IndexDocument::new(self.name.as_str(), collections.iter().map(|c| &**c));
            let index_path = self.routing.route(aux::DOCS);
            table.bind(HttpMethod::Get, &index_path, Endpoint::Index(Arc::new(index)))?;
        }

        tracing::info!(
            api = %self.name,
            collections = collections.len(),
            bindings = table.bindings.len(),
            "Route table compiled"
        );

        Ok(Api {
            name: self.name,
            routing: self.routing,
            hooks: self.hooks,
            features: self.features,
            collections,
            bindings: table.bindings,
        })
    }
}

/// A compiled application: immutable, cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct Api {
    name: String,
    routing: RoutingConfig,
    hooks: Hooks,
    features: FeatureRegistry,
    collections: Vec<Arc<Collection>>,
    bindings: Vec<Binding>,
}

impl Api {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ApiBuilder {
        ApiBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn routing(&self) -> &RoutingConfig {
        &self.routing
    }

    #[must_use]
    pub const fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    #[must_use]
    pub fn collections(&self) -> &[Arc<Collection>] {
        &self.collections
    }

    #[must_use]
    pub fn collection(&self, name: &str) -> Option<&Arc<Collection>> {
        self.collections.iter().find(|c| c.name() == name)
    }

    /// Resolves a collection by its names from the root, e.g. `["sample", "subsample"]`.
    #[must_use]
    pub fn collection_at(&self, lineage: &[&str]) -> Option<&Arc<Collection>> {
        let (root, rest) = lineage.split_first()?;
        rest.iter().try_fold(self.collection(root)?, |current, name| current.collection(name))
    }

    /// Every declared feature, enabled or not.
    #[must_use]
    pub const fn features(&self) -> &FeatureRegistry {
        &self.features
    }

    #[must_use]
    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.get(name)
    }

    /// Key under which `collection` is published.
    #[must_use]
    pub fn registry_key(&self, collection: &str) -> String {
        if self.routing.namespacing {
            format!("{}{NAMESPACE_SEPARATOR}{collection}", self.name)
        } else {
            collection.to_owned()
        }
    }

    /// Publishes the top-level collections into the process-wide registry.
    ///
    /// # Errors
    /// Returns [`DeclarationError::DuplicateCollection`] on a registry key clash.
    pub fn publish(&self) -> Result<(), DeclarationError> {
        registry::global().publish(self)
    }

    /// Finds the binding for `method` and a concrete `path`, static segments first.
    #[must_use]
    pub fn find(&self, method: HttpMethod, path: &str) -> Option<(&Binding, Inputs)> {
        self.bindings
            .iter()
            .filter(|b| b.method == method)
            .filter_map(|b| path::match_path(&b.path, path).map(|params| (b, params)))
            .min_by_key(|(_, params)| params.len())
    }

    /// Dispatches one request without a host router.
    ///
    /// Path parameters override same-named entries of `inputs`. Unknown paths answer
    /// `404`; known paths without a binding for `method` answer `405`.
    ///
    /// # Errors
    /// Propagates operation body errors.
    pub async fn handle(
        &self,
        method: HttpMethod,
        path: &str,
        mut inputs: Inputs,
    ) -> Result<Reply, ControlError> {
        let Some((binding, params)) = self.find(method, path) else {
            let known = self.bindings.iter().any(|b| path::match_path(&b.path, path).is_some());
            return Ok(if known {
                Reply::text(METHOD_NOT_ALLOWED, "Method Not Allowed")
            } else {
                Reply::text(404, "Not Found")
            });
        };

        inputs.extend(params);
        binding.endpoint.respond(inputs, &self.hooks).await
    }
}
