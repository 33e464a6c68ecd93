/// Pattern parsing
///
/// Pure functional parser that turns a pattern string into a [`Node`] tree.
/// All functions are **pure**: same input → same output, no side effects.

use crate::ast::{Node, QueryParam};

use super::pattern::{find_query_start, tokenize_segment, PatternError, Token};

/// Internal state accumulator for fold-based parsing
///
/// All mutations are local to the fold accumulator. Each builder method
/// returns the modified Self, enabling chaining.
#[derive(Default)]
struct ParseState {
    node: Option<Node>,
}

impl ParseState {
    /// Appends one path segment, carrying its leading `/`
    fn with_segment(mut self, tokens: Vec<Token>) -> Self {
        let mut nodes = tokens.into_iter().map(Token::into_node);
        let head = match nodes.next() {
            Some(Node::Literal(text)) => Node::literal(format!("/{text}")),
            Some(first) => Node::concat(Node::literal("/"), first),
            None => return self,
        };
        let segment = nodes.fold(head, Node::concat);

        self.node = Some(match self.node {
            Some(previous) => Node::concat(previous, segment),
            None => segment,
        });
        self
    }

    /// Finalizes the tree, handling the empty path case
    fn finalize(self) -> Node {
        self.node.unwrap_or_else(|| Node::literal("/"))
    }
}

/// Parses a pattern string, reporting malformed captures
///
/// # Parsing Rules
///
/// 1. The first `?` that is not a capture modifier starts the query part
/// 2. The path part is split on `/`; empty segments are discarded
/// 3. Each segment is tokenized and glued with `Concat`
/// 4. A present query part (even an empty one) wraps the path in `QueryParams`
///
/// # Examples
///
/// ```
/// use routeplex::ast::Node;
/// use routeplex::try_parse;
///
/// assert_eq!(try_parse("/about/").unwrap(), Node::literal("/about"));
/// assert_eq!(try_parse("").unwrap(), Node::literal("/"));
/// assert!(try_parse("/{user-:id").is_err());
/// ```
pub fn try_parse(pattern: &str) -> Result<Node, PatternError> {
    let (path, query) = match find_query_start(pattern) {
        Some(index) => (&pattern[..index], Some(&pattern[index + 1..])),
        None => (pattern, None),
    };

    let node = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .try_fold(ParseState::default(), |state, segment| {
            tokenize_segment(segment).map(|tokens| state.with_segment(tokens))
        })?
        .finalize();

    match query {
        Some(query) => Ok(Node::query_params(node, parse_query(query)?)),
        None => Ok(node),
    }
}

/// Parses a pattern string
///
/// # Panics
///
/// Panics when the pattern is malformed (see [`PatternError`]). Use
/// [`try_parse`] for patterns that do not come from source code.
pub fn parse(pattern: &str) -> Node {
    try_parse(pattern).unwrap_or_else(|err| panic!("invalid route pattern `{pattern}`: {err}"))
}

/// Parses `key=value&...`; an entry without `=` declares an empty literal value
fn parse_query(query: &str) -> Result<Vec<QueryParam>, PatternError> {
    query
        .split('&')
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
            parse_value(value).map(|value| QueryParam::new(key, value))
        })
        .collect()
}

/// Parses one query value with the segment grammar, without separators
fn parse_value(value: &str) -> Result<Node, PatternError> {
    let mut nodes = tokenize_segment(value)?.into_iter().map(Token::into_node);
    Ok(match nodes.next() {
        Some(head) => nodes.fold(head, Node::concat),
        None => Node::literal(""),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(node: Node) -> Node {
        Node::concat(Node::literal("/"), node)
    }

    #[test]
    fn test_parse_static() {
        assert_eq!(
            parse("/users/settings"),
            Node::concat(Node::literal("/users"), Node::literal("/settings"))
        );
    }

    #[test]
    fn test_parse_trailing_and_double_slashes() {
        assert_eq!(parse("/a/b/"), parse("/a/b"));
        assert_eq!(parse("a//b"), parse("/a/b"));
    }

    #[test]
    fn test_parse_root() {
        assert_eq!(parse("/"), Node::literal("/"));
        assert_eq!(parse(""), Node::literal("/"));
    }

    #[test]
    fn test_parse_dynamic_segments() {
        assert_eq!(
            parse("/users/:id"),
            Node::concat(Node::literal("/users"), seg(Node::param("id")))
        );
        assert_eq!(
            parse("/files/:path+"),
            Node::concat(Node::literal("/files"), seg(Node::one_or_more(Node::param("path"))))
        );
        assert_eq!(parse("/*?"), seg(Node::optional(Node::unnamed())));
    }

    #[test]
    fn test_parse_mixed_segment() {
        assert_eq!(
            parse("/v:version"),
            Node::concat(Node::literal("/v"), Node::param("version"))
        );
        assert_eq!(
            parse("/:name.json"),
            Node::concat(seg(Node::param("name")), Node::literal(".json"))
        );
    }

    #[test]
    fn test_parse_prefix() {
        assert_eq!(
            parse("/{user-:id}"),
            seg(Node::prefix("user-", Node::param("id")))
        );
    }

    #[test]
    fn test_parse_query() {
        let node = parse("/search?q=:query&page=:page?");
        assert_eq!(
            node,
            Node::query_params(
                Node::literal("/search"),
                vec![
                    QueryParam::new("q", Node::param("query")),
                    QueryParam::new("page", Node::optional(Node::param("page"))),
                ],
            )
        );
    }

    #[test]
    fn test_parse_empty_query_still_wraps() {
        assert_eq!(
            parse("/search?"),
            Node::query_params(Node::literal("/search"), vec![])
        );
        assert_eq!(
            parse("/?flag"),
            Node::query_params(Node::literal("/"), vec![QueryParam::new("flag", Node::literal(""))])
        );
    }

    #[test]
    fn test_parse_optional_before_query() {
        let node = parse("/posts/:id??sort=:sort");
        let (previous, params) = node.as_query_params().unwrap();
        assert_eq!(previous.to_path(), "/posts/:id?");
        assert_eq!(params[0].key, "sort");
    }

    #[test]
    fn test_to_path_round_trips() {
        for pattern in ["/users/:id", "/v:version/docs", "/{user-:id}", "/search?q=:q&page=:page?"] {
            assert_eq!(parse(pattern).to_path(), pattern);
        }
    }

    #[test]
    fn test_try_parse_reports_errors() {
        assert!(matches!(
            try_parse("/a/{b"),
            Err(PatternError::UnterminatedPrefix { .. })
        ));
        assert!(matches!(
            try_parse("/search?q=:"),
            Err(PatternError::MissingParamName { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "invalid route pattern")]
    fn test_parse_panics_on_malformed_prefix() {
        parse("/{nocapture}");
    }
}
