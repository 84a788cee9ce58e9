//! JSON documents served on the documentation bindings.
//!
//! Collections and operations serialize themselves in full. The entrypoint document
//! only summarizes the top-level collections and points at their own documents.

use crate::collection::Collection;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    pub name: String,
    pub collections: Vec<CollectionSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub path: String,
    pub docs: String,
    pub operations: Vec<String>,
}

impl From<&Collection> for CollectionSummary {
    fn from(collection: &Collection) -> Self {
        Self {
            name: collection.name().to_owned(),
            description: collection.description().map(ToOwned::to_owned),
            path: collection.path().to_owned(),
            docs: collection.docs_path().to_owned(),
            operations: collection.operations().iter().map(|o| o.name().to_owned()).collect(),
        }
    }
}

impl IndexDocument {
    pub fn new<'a, I>(name: impl Into<String>, collections: I) -> Self
    where
        I: IntoIterator<Item = &'a Collection>,
    {
        Self {
            name: name.into(),
            collections: collections.into_iter().map(CollectionSummary::from).collect(),
        }
    }
}
