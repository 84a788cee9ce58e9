//! # Collections
//!
//! A collection is a named resource node. Its [`CollectionBuilder`] accumulates
//! operations and nested child collections; compiling it yields an immutable
//! [`Collection`] tree whose nodes are shared behind `Arc`s during the serve phase.

use crate::error::DeclarationError;
use crate::feature::{Feature, FeatureRegistry};
use crate::hooks::Hooks;
use crate::operation::{Operation, OperationBuilder, OperationOwner};
use crate::path;
use crate::reply::{ControlError, Inputs, Reply};
use serde::Serialize;
use std::sync::Arc;
use warren_domain::config::RoutingConfig;
use warren_domain::method::HttpMethod;

pub const DEFAULT_ID_PARAM: &str = "id";

/// Declaration-time state of one collection and its subtree.
#[derive(Debug)]
pub struct CollectionBuilder {
    name: String,
    description: Option<String>,
    id_param: String,
    /// Set by `with_id`. Only then does a child sit behind its parent's member segment.
    custom_id: bool,
    no_member: bool,
    operations: Vec<OperationBuilder>,
    children: Vec<Self>,
    errors: Vec<DeclarationError>,
}

impl CollectionBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            id_param: DEFAULT_ID_PARAM.to_owned(),
            custom_id: false,
            no_member: false,
            operations: Vec::new(),
            children: Vec::new(),
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&mut self, text: impl Into<String>) -> &mut Self {
        self.description = Some(text.into());
        self
    }

    /// Renames the identifier placeholder used by member operations and by children.
    ///
    /// On a subcollection this also nests it under the parent's member segment:
    /// `/sample/:id/subsample` instead of `/sample/subsample`.
    pub fn with_id(&mut self, id_param: impl Into<String>) -> &mut Self {
        self.id_param = id_param.into();
        self.custom_id = true;
        self
    }

    /// Omits this collection's own name segment. Only meaningful on subcollections.
    pub const fn no_member(&mut self) -> &mut Self {
        self.no_member = true;
        self
    }

    /// Declares an operation following the standard naming convention.
    pub fn operation<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(&mut OperationBuilder),
    {
        self.push_operation(OperationBuilder::new(name), body)
    }

    /// Declares a custom operation whose method defaults to `POST`.
    pub fn action<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(&mut OperationBuilder),
    {
        self.push_operation(OperationBuilder::action(name), body)
    }

    fn push_operation<F>(&mut self, mut operation: OperationBuilder, body: F) -> &mut Self
    where
        F: FnOnce(&mut OperationBuilder),
    {
        if self.operations.iter().any(|o| o.name() == operation.name()) {
            self.errors.push(DeclarationError::DuplicateOperation {
                message: format!(
                    "Operation {} already registered in {} collection",
                    operation.name(),
                    self.name
                )
                .into(),
                context: None,
            });
            return self;
        }
        body(&mut operation);
        self.operations.push(operation);
        self
    }

    /// Declares a nested subcollection.
    pub fn collection<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        let mut child = Self::new(name);
        if self.children.iter().any(|c| c.name == child.name) {
            self.errors.push(DeclarationError::DuplicateCollection {
                message: format!("'{}' already declared under '{}'", child.name, self.name).into(),
                context: None,
            });
            return self;
        }
        body(&mut child);
        self.children.push(child);
        self
    }

    /// Bodies belong to operations. Attaching one to a collection fails compilation.
    pub fn control<F, Fut>(&mut self, _body: F) -> &mut Self
    where
        F: Fn(Inputs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, ControlError>> + Send + 'static,
    {
        self.errors.push(DeclarationError::ControlOutsideOperation {
            message: format!(
                "The 'control' statement must be used only within context of Operation (collection '{}')",
                self.name
            )
            .into(),
            context: None,
        });
        self
    }

    pub(crate) fn build(
        self,
        parent: Option<&Collection>,
        context: &CompileContext<'_>,
    ) -> Result<Collection, DeclarationError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        let relative = path::collection_path(
            parent.map(|p| p.relative.as_str()),
            parent.filter(|_| self.custom_id).map(|p| p.id_param.as_str()),
            &self.name,
            self.no_member && parent.is_some(),
        );
        path::check_unambiguous(&relative)?;

        let mut lineage = parent.map(|p| p.lineage.clone()).unwrap_or_default();
        lineage.push(self.name.clone());

        let features: Vec<Feature> = context
            .features
            .for_collection(&self.name)
            .filter(|f| context.hooks.feature_enabled(&self.name, f.name()))
            .cloned()
            .collect();

        let owner = OperationOwner {
            name: &self.name,
            path: &relative,
            id_param: &self.id_param,
            features: &features,
            routing: context.routing,
        };
        let operations = self
            .operations
            .into_iter()
            .map(|o| o.build(&owner, context.hooks).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        let mut collection = Collection {
            path: context.routing.route(&relative),
            docs_path: context.routing.route(&path::join("docs", &lineage.join("/"))),
            relative,
            name: self.name,
            description: self.description,
            id_param: self.id_param,
            lineage,
            operations,
            children: Vec::with_capacity(self.children.len()),
            features,
        };

        for child in self.children {
            let child = child.build(Some(&collection), context)?;
            collection.children.push(Arc::new(child));
        }

        Ok(collection)
    }
}

/// Shared inputs of one compilation run.
pub(crate) struct CompileContext<'a> {
    pub(crate) routing: &'a RoutingConfig,
    pub(crate) hooks: &'a Hooks,
    pub(crate) features: &'a FeatureRegistry,
}

/// A compiled, immutable collection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    path: String,
    #[serde(skip)]
    relative: String,
    #[serde(skip)]
    docs_path: String,
    id_param: String,
    #[serde(skip)]
    lineage: Vec<String>,
    operations: Vec<Arc<Operation>>,
    #[serde(rename = "collections")]
    children: Vec<Arc<Self>>,
    features: Vec<Feature>,
}

/// Result of an index lookup on a collection.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Collection(&'a Collection),
    Operation(&'a Operation),
}

impl Collection {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Full path, root prefix included.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path of the JSON documentation binding.
    #[must_use]
    pub fn docs_path(&self) -> &str {
        &self.docs_path
    }

    #[must_use]
    pub fn id_param(&self) -> &str {
        &self.id_param
    }

    /// Names from the root collection down to this one.
    #[must_use]
    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    #[must_use]
    pub fn is_subcollection(&self) -> bool {
        self.lineage.len() > 1
    }

    #[must_use]
    pub fn operations(&self) -> &[Arc<Operation>] {
        &self.operations
    }

    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&Arc<Operation>> {
        self.operations.iter().find(|o| o.name() == name)
    }

    #[must_use]
    pub fn collections(&self) -> &[Arc<Self>] {
        &self.children
    }

    #[must_use]
    pub fn collection(&self, name: &str) -> Option<&Arc<Self>> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Resolves `name` as a child collection first, then as an operation.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Node<'_>> {
        self.collection(name)
            .map(|c| Node::Collection(c))
            .or_else(|| self.operation(name).map(|o| Node::Operation(o)))
    }

    /// Features targeting this collection that passed the feature check.
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    #[must_use]
    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name() == name)
    }

    /// Methods answered on this collection's path: `OPTIONS` then every bound
    /// operation's method, without repeats.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<HttpMethod> {
        let mut methods = vec![HttpMethod::Options];
        for operation in self.operations.iter().filter(|o| o.gate().is_registered()) {
            if !methods.contains(&operation.method()) {
                methods.push(operation.method());
            }
        }
        methods
    }

    /// `Allow` value of the collection's `OPTIONS` binding.
    #[must_use]
    pub fn allow_header(&self) -> String {
        self.allowed_methods().iter().map(|m| m.as_str()).collect::<Vec<_>>().join(",")
    }

    /// Depth-first walk over this collection and every descendant.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &Self> + '_> {
        Box::new(std::iter::once(self).chain(self.children.iter().flat_map(|c| c.walk())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warren_domain::param::ParameterSchema;

    fn compile(builder: CollectionBuilder, features: &FeatureRegistry) -> Collection {
        let routing = RoutingConfig::default();
        let hooks = Hooks::default();
        let context = CompileContext { routing: &routing, hooks: &hooks, features };
        builder.build(None, &context).unwrap()
    }

    fn sample() -> CollectionBuilder {
        let mut sample = CollectionBuilder::new("sample");
        sample
            .description("Sample collection")
            .operation("index", |o| {
                o.param(ParameterSchema::string("id").required());
            })
            .operation("show", |_| {})
            .operation("create", |_| {})
            .operation("destroy", |_| {})
            .collection("subsample", |c| {
                c.with_id("sub_id").operation("show", |_| {}).operation("start", |_| {});
            });
        sample
    }

    #[test]
    fn test_nested_paths() {
        let sample = compile(sample(), &FeatureRegistry::default());
        let subsample = sample.collection("subsample").unwrap();

        assert_eq!(sample.path(), "/sample");
        assert_eq!(subsample.path(), "/sample/:id/subsample");
        assert_eq!(subsample.operation("show").unwrap().path(), "/sample/:id/subsample/:sub_id");
        assert_eq!(
            subsample.operation("start").unwrap().path(),
            "/sample/:id/subsample/:sub_id/start"
        );
        assert_eq!(subsample.lineage(), ["sample", "subsample"]);
        assert_eq!(subsample.docs_path(), "/docs/sample/subsample");
        assert!(subsample.operation("show").unwrap().param("sub_id").unwrap().is_required());
    }

    #[test]
    fn test_no_member_child_shares_parent_member_path() {
        let mut images = CollectionBuilder::new("images");
        images.collection("blob", |c| {
            c.no_member().with_id("blob_id").operation("show", |_| {});
        });

        let images = compile(images, &FeatureRegistry::default());
        let blob = images.collection("blob").unwrap();
        assert_eq!(blob.path(), "/images/:id");
        assert_eq!(blob.operation("show").unwrap().path(), "/images/:id/:blob_id");
    }

    #[test]
    fn test_allowed_methods_are_unique() {
        let sample = compile(sample(), &FeatureRegistry::default());
        assert_eq!(sample.allow_header(), "OPTIONS,GET,POST,DELETE");
    }

    #[test]
    fn test_index_lookup_prefers_collections() {
        let sample = compile(sample(), &FeatureRegistry::default());

        assert!(matches!(sample.get("subsample"), Some(Node::Collection(_))));
        assert!(matches!(sample.get("index"), Some(Node::Operation(_))));
        assert!(sample.get("missing").is_none());
        assert_eq!(sample.walk().count(), 2);
    }

    #[test]
    fn test_feature_params_reach_only_extended_operation() {
        let mut features = FeatureRegistry::default();
        features
            .declare("user_data", "sample", |f| {
                f.operation("index", [ParameterSchema::string("feature_data")]);
            })
            .unwrap();

        let sample = compile(sample(), &features);
        let index = sample.operation("index").unwrap();
        assert_eq!(index.allow_header(), "id:string:required,feature_data:string:optional");
        assert_eq!(index.features(), ["user_data"]);
        assert!(sample.operation("show").unwrap().param("feature_data").is_none());
        assert!(sample.feature("user_data").is_some());
    }

    #[test]
    fn test_duplicate_operation_fails() {
        let mut builder = CollectionBuilder::new("sample");
        builder.operation("index", |_| {}).operation("index", |_| {});

        let routing = RoutingConfig::default();
        let hooks = Hooks::default();
        let features = FeatureRegistry::default();
        let context = CompileContext { routing: &routing, hooks: &hooks, features: &features };
        let err = builder.build(None, &context).unwrap_err();
        assert!(matches!(err, DeclarationError::DuplicateOperation { .. }));
    }

    #[test]
    fn test_control_on_collection_fails() {
        let mut builder = CollectionBuilder::new("sample");
        builder.control(|_| async { Ok(Reply::ok()) });

        let routing = RoutingConfig::default();
        let hooks = Hooks::default();
        let features = FeatureRegistry::default();
        let context = CompileContext { routing: &routing, hooks: &hooks, features: &features };
        let err = builder.build(None, &context).unwrap_err();
        assert!(matches!(err, DeclarationError::ControlOutsideOperation { .. }));
    }
}
