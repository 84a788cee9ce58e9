use std::fmt;
use std::sync::Arc;

/// `(collection, feature) -> enabled`.
pub type FeatureCheck = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// `capability tag -> granted`.
pub type CapabilityCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// External predicates supplied by the deployment.
///
/// Both are optional; an absent predicate allows everything. They must be free of
/// side effects and may be called concurrently from many requests.
#[derive(Clone, Default)]
pub struct Hooks {
    feature_check: Option<FeatureCheck>,
    capability_check: Option<CapabilityCheck>,
}

impl Hooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_feature_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.feature_check = Some(Arc::new(check));
        self
    }

    #[must_use]
    pub fn with_capability_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.capability_check = Some(Arc::new(check));
        self
    }

    /// Whether `feature` may inject its parameters into `collection`'s operations.
    #[must_use]
    pub fn feature_enabled(&self, collection: &str, feature: &str) -> bool {
        self.feature_check.as_ref().is_none_or(|check| check(collection, feature))
    }

    /// Whether the caller holds `capability`. No predicate means gating is disabled.
    #[must_use]
    pub fn capability_granted(&self, capability: &str) -> bool {
        self.capability_check.as_ref().is_none_or(|check| check(capability))
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("feature_check", &self.feature_check.is_some())
            .field("capability_check", &self.capability_check.is_some())
            .finish()
    }
}
