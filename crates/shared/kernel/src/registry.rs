//! Boot-time table of published top-level collections.
//!
//! Written while applications publish their route tables at startup, read-only
//! afterwards. Names are `<collection>` or, with namespacing on, `<app>::<collection>`.

use crate::collection::Collection;
use crate::compiler::Api;
use crate::error::DeclarationError;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::sync::{Arc, LazyLock};

pub const NAMESPACE_SEPARATOR: &str = "::";

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Process-wide registry.
#[must_use]
pub fn global() -> &'static Registry {
    &GLOBAL
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    collections: Arc<RwLock<FxHashMap<String, Arc<Collection>>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes every top-level collection of `api`. Either all of them land or none.
    ///
    /// # Errors
    /// Returns [`DeclarationError::DuplicateCollection`] if a key is already taken.
    pub fn publish(&self, api: &Api) -> Result<(), DeclarationError> {
        let mut collections = self.collections.write();

        let entries: Vec<_> =
            api.collections().iter().map(|c| (api.registry_key(c.name()), Arc::clone(c))).collect();
        if let Some((key, _)) = entries.iter().find(|(key, _)| collections.contains_key(key)) {
            return Err(DeclarationError::DuplicateCollection {
                message: format!("'{key}' is already published").into(),
                context: Some(format!("publishing '{}'", api.name()).into()),
            });
        }

        for (key, collection) in entries {
            tracing::trace!(key = %key, "Collection published");
            collections.insert(key, collection);
        }
        Ok(())
    }

    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(key).cloned()
    }

    /// Sorted registry keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.collections.read().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.read().is_empty()
    }

    /// Drops every entry. Meant for process reloads and tests.
    pub fn clear(&self) {
        self.collections.write().clear();
    }
}
