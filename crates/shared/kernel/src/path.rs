//! Path synthesis.
//!
//! Paths are built relative to the routing root and use `:name` placeholders for
//! identifier segments. The root prefix is applied by [`RoutingConfig::route`].
//!
//! [`RoutingConfig::route`]: warren_domain::config::RoutingConfig::route

use crate::error::DeclarationError;
use crate::reply::Inputs;
use fxhash::FxHashSet;
use warren_domain::method::Scope;

/// Appends one literal segment.
#[must_use]
pub fn join(base: &str, segment: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segment.trim_matches('/'))
}

/// Appends a `:name` placeholder segment.
#[must_use]
pub fn join_param(base: &str, name: &str) -> String {
    format!("{}/:{name}", base.trim_end_matches('/'))
}

/// Path of a collection.
///
/// A root collection lives at `/<name>`. A child hangs below its parent's path, behind
/// the parent's member placeholder only when `parent_id` is given, and adds its own name
/// unless `no_member` is set.
///
/// ```rust
/// use warren_kernel::path::collection_path;
///
/// assert_eq!(collection_path(None, None, "sample", false), "/sample");
/// assert_eq!(collection_path(Some("/sample"), None, "subsample", false), "/sample/subsample");
/// assert_eq!(
///     collection_path(Some("/sample"), Some("id"), "subsample", false),
///     "/sample/:id/subsample"
/// );
/// assert_eq!(collection_path(Some("/sample"), Some("id"), "subsample", true), "/sample/:id");
/// ```
#[must_use]
pub fn collection_path(
    parent: Option<&str>,
    parent_id: Option<&str>,
    name: &str,
    no_member: bool,
) -> String {
    let Some(parent_path) = parent else {
        return join("", name);
    };
    let base = parent_id.map_or_else(|| parent_path.to_owned(), |id| join_param(parent_path, id));
    if no_member { base } else { join(&base, name) }
}

/// Path of an operation on the collection at `collection_path`.
#[must_use]
pub fn operation_path(
    collection_path: &str,
    id_param: &str,
    name: &str,
    scope: Scope,
    canonical: bool,
) -> String {
    let mut path = collection_path.to_owned();
    if scope == Scope::Member {
        path = join_param(&path, id_param);
    }
    if !canonical {
        path = join(&path, name);
    }
    path
}

/// Names of the placeholder segments, in order.
pub fn params(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter_map(|segment| segment.strip_prefix(':'))
}

/// Rejects paths naming the same placeholder twice.
///
/// # Errors
/// Returns [`DeclarationError::AmbiguousPath`] naming the repeated placeholder.
pub fn check_unambiguous(path: &str) -> Result<(), DeclarationError> {
    let mut seen = FxHashSet::default();
    for name in params(path) {
        if !seen.insert(name) {
            return Err(DeclarationError::AmbiguousPath {
                message: format!("'{path}' repeats ':{name}', pick a distinct subcollection id")
                    .into(),
                context: None,
            });
        }
    }
    Ok(())
}

/// Shape of a path with placeholder names erased, so `/a/:id` and `/a/:x` compare equal.
#[must_use]
pub fn route_key(path: &str) -> String {
    path.split('/')
        .map(|segment| if segment.starts_with(':') { ":" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

/// Matches a concrete request path against `pattern`, capturing placeholder values.
///
/// ```rust
/// use warren_kernel::path::match_path;
///
/// let params = match_path("/sample/:id/start", "/sample/42/start").unwrap();
/// assert_eq!(params["id"], "42");
/// assert!(match_path("/sample/:id", "/sample").is_none());
/// ```
#[must_use]
pub fn match_path(pattern: &str, path: &str) -> Option<Inputs> {
    let mut params = Inputs::new();
    let mut expected = pattern.split('/');
    let mut actual = path.split('/');
    loop {
        match (expected.next(), actual.next()) {
            (None, None) => return Some(params),
            (Some(want), Some(got)) => {
                if let Some(name) = want.strip_prefix(':') {
                    if got.is_empty() {
                        return None;
                    }
                    params.insert(name.to_owned(), got.to_owned());
                } else if want != got {
                    return None;
                }
            },
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_operation_paths() {
        let sample = collection_path(None, None, "sample", false);
        let subsample = collection_path(Some(&sample), Some("id"), "subsample", false);

        assert_eq!(
            operation_path(&subsample, "sub_id", "show", Scope::Member, true),
            "/sample/:id/subsample/:sub_id"
        );
        assert_eq!(
            operation_path(&subsample, "sub_id", "start", Scope::Member, false),
            "/sample/:id/subsample/:sub_id/start"
        );
        assert_eq!(operation_path(&sample, "id", "index", Scope::Collection, true), "/sample");
    }

    #[test]
    fn test_child_without_own_id_skips_parent_member() {
        let subsample = collection_path(Some("/sample"), None, "subsample", false);

        assert_eq!(subsample, "/sample/subsample");
        assert_eq!(
            operation_path(&subsample, "id", "show", Scope::Member, true),
            "/sample/subsample/:id"
        );
    }

    #[test]
    fn test_repeated_placeholder_is_ambiguous() {
        assert!(check_unambiguous("/sample/:id/subsample/:sub_id").is_ok());
        let err = check_unambiguous("/sample/:id/subsample/:id").unwrap_err();
        assert!(matches!(err, DeclarationError::AmbiguousPath { .. }));
    }

    #[test]
    fn test_static_segments_must_match() {
        assert!(match_path("/sample/index", "/sample/other").is_none());
        assert!(match_path("/sample/:id", "/sample/1/extra").is_none());
        assert_eq!(match_path("/sample", "/sample"), Some(Inputs::new()));
    }

    #[test]
    fn test_route_key_erases_names() {
        assert_eq!(route_key("/sample/:id/start"), route_key("/sample/:other/start"));
        assert_ne!(route_key("/sample/:id"), route_key("/sample/index"));
    }
}
