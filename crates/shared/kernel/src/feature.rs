//! # Feature Registry
//!
//! Features are named bundles of extra parameters spliced into specific operations of a
//! specific collection, independently of the collection's own declaration. Declaring a
//! feature name twice merges the second body into the first.
//!
//! ```rust
//! use warren_domain::param::ParameterSchema;
//! use warren_kernel::feature::FeatureRegistry;
//!
//! let mut features = FeatureRegistry::default();
//! features
//!     .declare("user_data", "sample", |f| {
//!         f.operation("index", [ParameterSchema::string("feature_data")]);
//!     })
//!     .unwrap();
//! features
//!     .declare("user_data", "", |f| {
//!         f.constraint("max_length", 32);
//!     })
//!     .unwrap();
//!
//! let feature = features.get("user_data").unwrap();
//! assert_eq!(feature.collection(), "sample");
//! assert_eq!(feature.constraints().len(), 1);
//! ```

use crate::error::DeclarationError;
use serde::Serialize;
use std::collections::BTreeMap;
use warren_domain::param::ParameterSchema;

/// Parameters a feature adds to one operation.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureOperation {
    name: String,
    params: Vec<ParameterSchema>,
}

impl FeatureOperation {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &[ParameterSchema] {
        &self.params
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    name: String,
    collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    operations: Vec<FeatureOperation>,
    /// Carried for consumers, never interpreted by the compiler.
    constraints: BTreeMap<String, serde_json::Value>,
}

impl Feature {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The collection whose operations this feature extends.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn operations(&self) -> &[FeatureOperation] {
        &self.operations
    }

    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&FeatureOperation> {
        self.operations.iter().find(|o| o.name == name)
    }

    #[must_use]
    pub const fn constraints(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.constraints
    }

    /// Returns `true` when this feature injects parameters into `operation`.
    #[must_use]
    pub fn extends(&self, operation: &str) -> bool {
        self.operation(operation).is_some()
    }
}

/// Scoped builder handed to a feature declaration body.
#[derive(Debug)]
pub struct FeatureBuilder<'a> {
    feature: &'a mut Feature,
}

impl FeatureBuilder<'_> {
    pub fn description(&mut self, text: impl Into<String>) -> &mut Self {
        self.feature.description.get_or_insert_with(|| text.into());
        self
    }

    /// Appends parameters to `operation`, merging with earlier declarations of it.
    pub fn operation<I>(&mut self, operation: impl Into<String>, params: I) -> &mut Self
    where
        I: IntoIterator<Item = ParameterSchema>,
    {
        let operation = operation.into();
        let params = params.into_iter();
        match self.feature.operations.iter_mut().find(|o| o.name == operation) {
            Some(existing) => existing.params.extend(params),
            None => self
                .feature
                .operations
                .push(FeatureOperation { name: operation, params: params.collect() }),
        }
        self
    }

    pub fn constraint(
        &mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> &mut Self {
        self.feature.constraints.insert(name.into(), value.into());
        self
    }
}

/// All features declared by one application, in declaration order.
#[derive(Debug, Default, Clone)]
pub struct FeatureRegistry {
    features: Vec<Feature>,
}

impl FeatureRegistry {
    /// Declares `name` for `collection`, or merges `body` into an existing feature.
    ///
    /// An empty `collection` is accepted when merging and means "keep the current target".
    ///
    /// # Errors
    /// Returns [`DeclarationError::FeatureTarget`] if a new feature has no target
    /// collection, or a redeclaration names a different one.
    pub fn declare<F>(
        &mut self,
        name: &str,
        collection: &str,
        body: F,
    ) -> Result<&Feature, DeclarationError>
    where
        F: FnOnce(&mut FeatureBuilder<'_>),
    {
        let index = match self.features.iter().position(|f| f.name == name) {
            Some(index) => {
                let current = &self.features[index].collection;
                if !collection.is_empty() && current != collection {
                    return Err(DeclarationError::FeatureTarget {
                        message: format!(
                            "Feature '{name}' targets '{current}', cannot re-target to '{collection}'"
                        )
                        .into(),
                        context: None,
                    });
                }
                index
            },
            None => {
                if collection.trim().is_empty() {
                    return Err(DeclarationError::FeatureTarget {
                        message: format!("Feature '{name}' must name the collection it extends")
                            .into(),
                        context: None,
                    });
                }
                self.features.push(Feature {
                    name: name.to_owned(),
                    collection: collection.to_owned(),
                    description: None,
                    operations: Vec::new(),
                    constraints: BTreeMap::new(),
                });
                self.features.len() - 1
            },
        };

        let feature = &mut self.features[index];
        body(&mut FeatureBuilder { feature });
        tracing::trace!(feature = name, collection = %feature.collection, "Feature declared");
        Ok(&self.features[index])
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Features targeting `collection`, regardless of any feature check.
    pub fn for_collection<'a>(&'a self, collection: &'a str) -> impl Iterator<Item = &'a Feature> {
        self.features.iter().filter(move |f| f.collection == collection)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
