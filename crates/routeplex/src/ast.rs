//! Pattern syntax tree
//!
//! A route pattern is held as an immutable tree of [`Node`]s. Children are
//! shared through `Arc`, so composing two patterns never copies or mutates the
//! subtrees it builds on.
//!
//! Path separators live inside literal text: the parser emits `Literal("/users")`
//! for a plain segment and `Literal("/")` in front of a segment that starts with
//! a capture. Nodes glued together without a `/` belong to the same path
//! segment.

use std::fmt;
use std::sync::Arc;

use crate::schema::Schema;

// ============================================================================
// Core Types
// ============================================================================

/// One node of a route pattern
///
/// # Examples
///
/// ```
/// use routeplex::ast::Node;
///
/// let node = Node::concat(Node::literal("/users"), Node::concat(Node::literal("/"), Node::param("id")));
/// assert_eq!(node.to_path(), "/users/:id");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Exact text, may carry `/` separators
    Literal(String),
    /// Named single-value capture: `:name`
    Param(String),
    /// Positional capture: `*`
    UnnamedParam,
    /// Zero or one occurrence: `?`
    Optional(Arc<Node>),
    /// Zero or more occurrences, captured as a list: `*`
    ZeroOrMore(Arc<Node>),
    /// One or more occurrences, captured as a list: `+`
    OneOrMore(Arc<Node>),
    /// Text glued in front of the inner capture: `{text:name}`
    Prefix(String, Arc<Node>),
    /// Ordered composition
    Concat(Arc<Node>, Arc<Node>),
    /// Trailing query block
    QueryParams(Arc<Node>, Vec<QueryParam>),
    /// Validator attachment, ignored by matching and rendering
    WithSchema(Arc<Node>, Schema),
}

/// One declared query key and the pattern of its value
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParam {
    pub key: String,
    pub value: Arc<Node>,
}

impl QueryParam {
    pub fn new(key: impl Into<String>, value: Node) -> Self {
        Self {
            key: key.into(),
            value: Arc::new(value),
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl Node {
    pub fn literal(text: impl Into<String>) -> Self {
        Node::Literal(text.into())
    }

    pub fn param(name: impl Into<String>) -> Self {
        Node::Param(name.into())
    }

    pub fn unnamed() -> Self {
        Node::UnnamedParam
    }

    pub fn optional(inner: Node) -> Self {
        Node::Optional(Arc::new(inner))
    }

    pub fn zero_or_more(inner: Node) -> Self {
        Node::ZeroOrMore(Arc::new(inner))
    }

    pub fn one_or_more(inner: Node) -> Self {
        Node::OneOrMore(Arc::new(inner))
    }

    pub fn prefix(text: impl Into<String>, inner: Node) -> Self {
        Node::Prefix(text.into(), Arc::new(inner))
    }

    /// Plain ordered composition, without query-block merging
    ///
    /// Use [`crate::concat`] to compose two complete patterns.
    pub fn concat(left: Node, right: Node) -> Self {
        Node::Concat(Arc::new(left), Arc::new(right))
    }

    /// Wraps `previous` in a query block
    ///
    /// Declaring the same key twice keeps the last definition, at the position
    /// of that last definition.
    ///
    /// # Examples
    ///
    /// ```
    /// use routeplex::ast::{Node, QueryParam};
    ///
    /// let node = Node::query_params(
    ///     Node::literal("/search"),
    ///     vec![
    ///         QueryParam::new("q", Node::param("a")),
    ///         QueryParam::new("page", Node::param("page")),
    ///         QueryParam::new("q", Node::param("b")),
    ///     ],
    /// );
    /// assert_eq!(node.to_path(), "/search?page=:page&q=:b");
    /// ```
    pub fn query_params(previous: Node, params: Vec<QueryParam>) -> Self {
        Node::QueryParams(Arc::new(previous), dedup_query_params(params))
    }

    pub fn with_schema(inner: Node, schema: Schema) -> Self {
        Node::WithSchema(Arc::new(inner), schema)
    }
}

/// Keeps the last definition of every key
pub(crate) fn dedup_query_params(params: Vec<QueryParam>) -> Vec<QueryParam> {
    let mut kept: Vec<QueryParam> = Vec::with_capacity(params.len());
    for param in params.into_iter().rev() {
        if !kept.iter().any(|p| p.key == param.key) {
            kept.push(param);
        }
    }
    kept.reverse();
    kept
}

// ============================================================================
// Inspection
// ============================================================================

impl Node {
    /// `Literal("")` or the bare root separator `Literal("/")`
    pub fn is_empty_literal(&self) -> bool {
        matches!(self, Node::Literal(text) if text.is_empty() || text == "/")
    }

    /// Splits a query block into its path part and declared params
    pub fn as_query_params(&self) -> Option<(&Arc<Node>, &[QueryParam])> {
        match self {
            Node::QueryParams(previous, params) => Some((previous, params.as_slice())),
            _ => None,
        }
    }

    /// Whether a `Param(name)` occurs anywhere in this tree
    pub fn has_param(&self, name: &str) -> bool {
        match self {
            Node::Param(n) => n == name,
            Node::Literal(_) | Node::UnnamedParam => false,
            Node::Optional(inner)
            | Node::ZeroOrMore(inner)
            | Node::OneOrMore(inner)
            | Node::Prefix(_, inner)
            | Node::WithSchema(inner, _) => inner.has_param(name),
            Node::Concat(left, right) => left.has_param(name) || right.has_param(name),
            Node::QueryParams(previous, params) => {
                previous.has_param(name) || params.iter().any(|p| p.value.has_param(name))
            }
        }
    }

    /// Rebuilds the tree with every `Param(name)` wrapped in `WithSchema`
    ///
    /// # Examples
    ///
    /// ```
    /// use routeplex::ast::Node;
    /// use routeplex::schema::{Constraint, Schema};
    ///
    /// let node = routeplex::parse("/users/:id");
    /// let typed = node.with_param_schema("id", &Schema::new(Constraint::Int));
    /// assert_ne!(node, typed);
    /// assert_eq!(node.to_path(), typed.to_path());
    /// ```
    pub fn with_param_schema(&self, name: &str, schema: &Schema) -> Node {
        let rebuild = |inner: &Arc<Node>| Arc::new(inner.with_param_schema(name, schema));
        match self {
            Node::Param(n) if n == name => Node::with_schema(self.clone(), schema.clone()),
            Node::Param(_) | Node::Literal(_) | Node::UnnamedParam => self.clone(),
            Node::Optional(inner) => Node::Optional(rebuild(inner)),
            Node::ZeroOrMore(inner) => Node::ZeroOrMore(rebuild(inner)),
            Node::OneOrMore(inner) => Node::OneOrMore(rebuild(inner)),
            Node::Prefix(text, inner) => Node::Prefix(text.clone(), rebuild(inner)),
            Node::Concat(left, right) => Node::Concat(rebuild(left), rebuild(right)),
            Node::QueryParams(previous, params) => Node::QueryParams(
                rebuild(previous),
                params
                    .iter()
                    .map(|p| QueryParam {
                        key: p.key.clone(),
                        value: rebuild(&p.value),
                    })
                    .collect(),
            ),
            Node::WithSchema(inner, attached) => Node::WithSchema(rebuild(inner), attached.clone()),
        }
    }
}

// ============================================================================
// Rendering back to pattern syntax
// ============================================================================

impl Node {
    /// Renders the node in pattern syntax
    ///
    /// The output is not normalized; [`crate::Route::path`] collapses the
    /// separators that composition leaves behind.
    pub fn to_path(&self) -> String {
        let mut out = String::new();
        self.write_path(&mut out);
        out
    }

    fn write_path(&self, out: &mut String) {
        match self {
            Node::Literal(text) => out.push_str(text),
            Node::Param(name) => {
                out.push(':');
                out.push_str(name);
            }
            Node::UnnamedParam => out.push('*'),
            Node::Optional(inner) => {
                inner.write_path(out);
                out.push('?');
            }
            Node::ZeroOrMore(inner) => {
                inner.write_path(out);
                out.push('*');
            }
            Node::OneOrMore(inner) => {
                inner.write_path(out);
                out.push('+');
            }
            Node::Prefix(text, inner) => {
                let capture = inner.to_path();
                out.push('{');
                out.push_str(text);
                out.push(':');
                out.push_str(capture.strip_prefix(':').unwrap_or(&capture));
                out.push('}');
            }
            Node::Concat(left, right) => {
                left.write_path(out);
                right.write_path(out);
            }
            Node::QueryParams(previous, params) => {
                previous.write_path(out);
                out.push('?');
                out.push_str(&query_template(params));
            }
            Node::WithSchema(inner, _) => inner.write_path(out),
        }
    }
}

/// `key=value` entries of a query block in pattern syntax
pub(crate) fn query_template(params: &[QueryParam]) -> String {
    params
        .iter()
        .map(|p| format!("{}={}", p.key, p.value.to_path()))
        .collect::<Vec<_>>()
        .join("&")
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Constraint;

    #[test]
    fn test_to_path_captures() {
        assert_eq!(Node::param("id").to_path(), ":id");
        assert_eq!(Node::optional(Node::param("id")).to_path(), ":id?");
        assert_eq!(Node::zero_or_more(Node::param("rest")).to_path(), ":rest*");
        assert_eq!(Node::one_or_more(Node::unnamed()).to_path(), "*+");
    }

    #[test]
    fn test_to_path_prefix() {
        assert_eq!(Node::prefix("user-", Node::param("id")).to_path(), "{user-:id}");
        assert_eq!(Node::prefix("v", Node::unnamed()).to_path(), "{v:*}");
        assert_eq!(
            Node::prefix("v", Node::optional(Node::param("n"))).to_path(),
            "{v:n?}"
        );
    }

    #[test]
    fn test_empty_literal() {
        assert!(Node::literal("").is_empty_literal());
        assert!(Node::literal("/").is_empty_literal());
        assert!(!Node::literal("/users").is_empty_literal());
        assert!(!Node::param("id").is_empty_literal());
    }

    #[test]
    fn test_query_params_dedup_keeps_last() {
        let node = Node::query_params(
            Node::literal("/"),
            vec![
                QueryParam::new("a", Node::param("x")),
                QueryParam::new("b", Node::param("y")),
                QueryParam::new("a", Node::param("z")),
            ],
        );
        let (_, params) = node.as_query_params().unwrap();
        let keys: Vec<&str> = params.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(*params[1].value, Node::param("z"));
    }

    #[test]
    fn test_has_param() {
        let node = Node::query_params(
            Node::concat(Node::literal("/posts/"), Node::param("slug")),
            vec![QueryParam::new("page", Node::optional(Node::param("page")))],
        );
        assert!(node.has_param("slug"));
        assert!(node.has_param("page"));
        assert!(!node.has_param("id"));
    }

    #[test]
    fn test_with_param_schema_wraps_only_named_param() {
        let schema = Schema::new(Constraint::Int);
        let node = Node::concat(Node::param("id"), Node::param("other"));
        let typed = node.with_param_schema("id", &schema);

        match typed {
            Node::Concat(left, right) => {
                assert!(matches!(&*left, Node::WithSchema(inner, _) if **inner == Node::param("id")));
                assert_eq!(*right, Node::param("other"));
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn test_display_matches_to_path() {
        let node = Node::concat(Node::literal("/files/"), Node::one_or_more(Node::param("path")));
        assert_eq!(node.to_string(), "/files/:path+");
    }
}
