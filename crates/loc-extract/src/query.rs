//! Element queries

use std::fmt;

/// Local name selected when no other query is configured.
pub const DEFAULT_LOCAL_NAME: &str = "loc";

/// A query over a parsed document.
///
/// Matching ignores namespace prefixes and namespace URIs entirely:
/// `<loc>`, `<a:loc xmlns:a="urn:x">` and `<loc xmlns="urn:y">` are all
/// selected by `Query::local_name("loc")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Every element, at any depth, whose local name equals the given name
    LocalName(String),
}

impl Query {
    pub fn local_name<S: Into<String>>(name: S) -> Self {
        Query::LocalName(name.into())
    }

    /// Check an element's local name against this query
    pub fn matches_local_name(&self, local: &str) -> bool {
        match self {
            Query::LocalName(name) => name == local,
        }
    }
}

impl Default for Query {
    fn default() -> Self {
        Query::local_name(DEFAULT_LOCAL_NAME)
    }
}

/// Renders the equivalent XPath 1.0 expression.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::LocalName(name) => write!(f, "//*[local-name()='{}']", name),
        }
    }
}
