use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP verbs the route compiler binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an operation acts on the resource set or on one identified member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Collection,
    Member,
}

/// Routing convention attached to an operation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convention {
    pub method: HttpMethod,
    pub scope: Scope,
    /// Canonical operations contribute no literal action segment to their path.
    pub canonical: bool,
}

/// The five canonical REST operations.
pub const STANDARD_OPERATIONS: [(&str, Convention); 5] = [
    ("create", Convention { method: HttpMethod::Post, scope: Scope::Collection, canonical: true }),
    ("index", Convention { method: HttpMethod::Get, scope: Scope::Collection, canonical: true }),
    ("show", Convention { method: HttpMethod::Get, scope: Scope::Member, canonical: true }),
    ("destroy", Convention { method: HttpMethod::Delete, scope: Scope::Member, canonical: true }),
    ("update", Convention { method: HttpMethod::Patch, scope: Scope::Member, canonical: true }),
];

/// Convention for names outside the canonical table: a `GET` member action.
pub const CUSTOM_OPERATION: Convention =
    Convention { method: HttpMethod::Get, scope: Scope::Member, canonical: false };

/// Looks up the routing convention for an operation name.
///
/// ```rust
/// use warren_domain::method::{HttpMethod, Scope, convention_for};
///
/// assert_eq!(convention_for("destroy").method, HttpMethod::Delete);
/// assert_eq!(convention_for("restart").scope, Scope::Member);
/// assert!(!convention_for("restart").canonical);
/// ```
#[must_use]
pub fn convention_for(name: &str) -> Convention {
    STANDARD_OPERATIONS
        .iter()
        .find_map(|(standard, convention)| (*standard == name).then_some(*convention))
        .unwrap_or(CUSTOM_OPERATION)
}

/// Returns `true` for canonical members (`show`, `destroy`, `update`), which imply an id input.
#[must_use]
pub fn implies_id(name: &str) -> bool {
    let convention = convention_for(name);
    convention.canonical && convention.scope == Scope::Member
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table() {
        assert_eq!(convention_for("create").method, HttpMethod::Post);
        assert_eq!(convention_for("create").scope, Scope::Collection);
        assert_eq!(convention_for("index").method, HttpMethod::Get);
        assert_eq!(convention_for("show").scope, Scope::Member);
        assert_eq!(convention_for("update").method, HttpMethod::Patch);
    }

    #[test]
    fn test_implied_id() {
        assert!(implies_id("show"));
        assert!(implies_id("destroy"));
        assert!(implies_id("update"));
        assert!(!implies_id("index"));
        assert!(!implies_id("stop"));
    }

    #[test]
    fn test_method_names() {
        assert_eq!(HttpMethod::Options.to_string(), "OPTIONS");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }
}
