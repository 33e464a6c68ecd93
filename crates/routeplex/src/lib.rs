//! # Routeplex
//!
//! A bidirectional route engine: the same pattern both matches concrete
//! URL-like strings and renders them back from parameters.
//!
//! - Static segments (`/about`)
//! - Named captures (`/users/:id`) with `?`, `*` and `+` modifiers
//! - Unnamed captures (`/files/*`) keyed by position
//! - Prefixed captures (`/{user-:id}`) and mixed segments (`/:name.:ext`)
//! - Query blocks (`/search?q=:query&page=:page?`)
//!
//! ## Approach
//!
//! - Patterns are immutable [`Node`] trees; [`concat`] builds new trees and
//!   keeps a single query block outermost
//! - A [`Route`] compiles its matcher and interpolator on first use and caches
//!   them in compute-once cells, so a route can be shared between threads
//! - Matching is structural and greedy, with no backtracking
//! - Typed values go through [`codec::decode`] and [`codec::encode`] using the
//!   schemas attached to captures
//!
//! ## Example
//!
//! ```
//! use routeplex::{ParamMap, Route};
//!
//! let route = Route::parse("/users/:id").with_end(true);
//!
//! let params = route.matches("/users/123").unwrap();
//! assert_eq!(params.get_str("id"), Some("123"));
//! assert!(route.matches("/users/123/posts").is_none());
//!
//! let params: ParamMap = [("id", "7")].into_iter().collect();
//! assert_eq!(route.interpolate(&params), "/users/7");
//! ```

use std::borrow::Cow;
use std::fmt;

use once_cell::sync::OnceCell;
use tracing::trace;

use crate::params::decode_segment;

// ============================================================================
// Module Declarations
// ============================================================================

pub mod ast;
pub mod codec;
pub mod compile;
mod concat;
pub mod config;
pub mod params;
pub mod path;
pub mod route;
pub mod schema;
pub mod specificity;

pub use ast::{Node, QueryParam};
pub use codec::{decode, encode, DecodeError, EncodeError};
pub use compile::{Interpolator, Matcher};
pub use concat::concat;
pub use config::{NamedRoute, RouteEntry, RouteManifest};
pub use params::{ParamKey, ParamMap, ParamValue, QueryMap};
pub use path::{normalize_path, path_segments, split_path_and_query};
pub use route::{parse, try_parse, PatternError};
pub use schema::{Constraint, Issue, IssueKind, ParamSchema, Schema};
pub use specificity::{compare_specificity, sort_routes, sort_templates};

// ============================================================================
// Core Types
// ============================================================================

/// A pattern plus its `end` flag, with lazily compiled matcher and interpolator
///
/// `end` requires a match to consume every path segment; it defaults to
/// `false`, which accepts trailing segments.
#[derive(Debug, Clone)]
pub struct Route {
    ast: Node,
    end: bool,
    path: OnceCell<String>,
    matcher: OnceCell<Matcher>,
    interpolator: OnceCell<Interpolator>,
}

impl Route {
    pub fn new(ast: Node) -> Self {
        Self {
            ast,
            end: false,
            path: OnceCell::new(),
            matcher: OnceCell::new(),
            interpolator: OnceCell::new(),
        }
    }

    /// Parses a pattern into a route
    ///
    /// # Panics
    ///
    /// Panics on a malformed pattern, see [`try_parse`].
    pub fn parse(pattern: &str) -> Self {
        Self::new(parse(pattern))
    }

    pub fn try_parse(pattern: &str) -> Result<Self, PatternError> {
        try_parse(pattern).map(Self::new)
    }

    /// Sets the full-consumption flag (builder style)
    pub fn with_end(mut self, end: bool) -> Self {
        if self.end != end {
            self.end = end;
            self.matcher = OnceCell::new();
        }
        self
    }

    pub fn ast(&self) -> &Node {
        &self.ast
    }

    pub fn is_end(&self) -> bool {
        self.end
    }

    /// Canonical pattern text of this route
    ///
    /// # Examples
    ///
    /// ```
    /// use routeplex::Route;
    ///
    /// let route = Route::parse("/").concat(&Route::parse("/users/:id/"));
    /// assert_eq!(route.path(), "/users/:id");
    /// ```
    pub fn path(&self) -> &str {
        self.path.get_or_init(|| match self.ast.as_query_params() {
            Some((previous, params)) => format!(
                "{}?{}",
                normalize_path(&previous.to_path()),
                ast::query_template(params)
            ),
            None => normalize_path(&self.ast.to_path()).into_owned(),
        })
    }

    pub fn matcher(&self) -> &Matcher {
        self.matcher.get_or_init(|| Matcher::compile(&self.ast, self.end))
    }

    pub fn interpolator(&self) -> &Interpolator {
        self.interpolator.get_or_init(|| Interpolator::compile(&self.ast))
    }

    /// Matches a raw `path?query` string
    ///
    /// Path segments are percent-decoded before matching. Returns `None` on a
    /// structural mismatch.
    pub fn matches(&self, raw: &str) -> Option<ParamMap> {
        let (path, query) = split_path_and_query(raw);
        let decoded: Vec<Cow<'_, str>> = path_segments(path)
            .into_iter()
            .map(decode_segment)
            .collect();
        let segments: Vec<&str> = decoded.iter().map(AsRef::as_ref).collect();
        let query = QueryMap::parse(query.unwrap_or_default());

        let params = self.matches_parts(&segments, &query);
        if params.is_none() {
            trace!(route = %self.path(), raw, "route did not match");
        }
        params
    }

    /// Matches pre-split path segments and a parsed query
    pub fn matches_parts(&self, segments: &[&str], query: &QueryMap) -> Option<ParamMap> {
        self.matcher().match_parts(segments, query)
    }

    /// Renders this route from parameters
    ///
    /// # Panics
    ///
    /// Panics when a required parameter is absent or empty.
    pub fn interpolate(&self, params: &ParamMap) -> String {
        self.interpolator().interpolate(params)
    }

    /// Appends `other`; the result takes `other`'s `end` flag
    ///
    /// # Examples
    ///
    /// ```
    /// use routeplex::Route;
    ///
    /// let api = Route::parse("/api?version=:v");
    /// let users = Route::parse("/users/:id").with_end(true);
    /// let route = api.concat(&users);
    ///
    /// assert_eq!(route.path(), "/api/users/:id?version=:v");
    /// assert!(route.is_end());
    /// ```
    pub fn concat(&self, other: &Route) -> Route {
        Route::new(concat(&self.ast, &other.ast)).with_end(other.end)
    }
}

impl From<Node> for Route {
    fn from(ast: Node) -> Self {
        Self::new(ast)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_route_defaults() {
        let route = Route::parse("/about");
        assert!(!route.is_end());
        assert_eq!(route.path(), "/about");
        assert_eq!(route.to_string(), "/about");
    }

    #[test]
    fn test_path_with_query() {
        let route = Route::parse("/search/?q=:query&page=:page?");
        assert_eq!(route.path(), "/search?q=:query&page=:page?");
        assert_eq!(Route::parse("/?lang=:lang").path(), "/?lang=:lang");
    }

    #[test]
    fn test_with_end_recompiles_matcher() {
        let route = Route::parse("/articles/:slug");
        assert!(route.matches("/articles/1/comments").is_some());
        assert!(!route.matcher().requires_full_consumption());

        let route = route.with_end(true);
        assert!(route.matcher().requires_full_consumption());
        assert!(route.matches("/articles/1/comments").is_none());
    }

    #[test]
    fn test_matches_splits_query() {
        let route = Route::parse("/search?q=:query");
        let params = route.matches("/search/?q=a+b").unwrap();
        assert_eq!(params.get_str("query"), Some("a b"));
    }

    #[test]
    fn test_matches_decodes_path_segments() {
        let route = Route::parse("/users/:id").with_end(true);
        let params = route.matches("/users/a%3Fb%2Fc").unwrap();
        assert_eq!(params.get_str("id"), Some("a?b/c"));
        assert_eq!(route.matches("/users/a+b").unwrap().get_str("id"), Some("a+b"));
        assert!(Route::parse("/café").matches("/caf%C3%A9").is_some());
    }

    #[test]
    fn test_cached_parts_are_reused() {
        let route = Route::parse("/users/:id");
        assert!(std::ptr::eq(route.matcher(), route.matcher()));
        assert!(std::ptr::eq(route.interpolator(), route.interpolator()));
    }

    #[test]
    fn test_concat_routes() {
        let route = Route::parse("/").concat(&Route::parse("/docs"));
        assert_eq!(route.path(), "/docs");
        assert!(route.matches("/docs").is_some());
    }

    #[test]
    fn test_try_parse() {
        assert!(Route::try_parse("/{broken").is_err());
        assert_eq!(Route::try_parse("/ok").unwrap().path(), "/ok");
    }

    #[test]
    fn test_route_is_shareable_across_threads() {
        let route = std::sync::Arc::new(Route::parse("/users/:id").with_end(true));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let route = std::sync::Arc::clone(&route);
                std::thread::spawn(move || {
                    route
                        .matches(&format!("/users/{i}"))
                        .and_then(|params| params.get_str("id").map(str::to_string))
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), Some(i.to_string()));
        }
    }
}
