//! Pattern composition
//!
//! Concatenation keeps the query block outermost: whichever side carries one,
//! the result has a single `QueryParams` node wrapping the combined path.

use std::sync::Arc;

use tracing::trace;

use crate::ast::{dedup_query_params, Node};

/// Composes two patterns, merging their query blocks
///
/// When both sides declare a query key, the right-hand definition wins; the
/// merged block lists left-only keys first, then the right-hand keys.
///
/// # Examples
///
/// ```
/// use routeplex::{concat, parse};
///
/// let node = concat(&parse("/users?page=:page"), &parse("/:id/edit?sort=:sort"));
/// assert_eq!(node.to_path(), "/users/:id/edit?page=:page&sort=:sort");
/// ```
pub fn concat(left: &Node, right: &Node) -> Node {
    trace!(left = %left, right = %right, "concatenating patterns");

    match (left.as_query_params(), right.as_query_params()) {
        (Some((left_prev, left_params)), Some((right_prev, right_params))) => {
            let params = left_params
                .iter()
                .filter(|p| !right_params.iter().any(|r| r.key == p.key))
                .chain(right_params)
                .cloned()
                .collect();
            Node::QueryParams(
                Arc::new(merge(left_prev, right_prev)),
                dedup_query_params(params),
            )
        }
        (Some((left_prev, left_params)), None) => Node::QueryParams(
            Arc::new(merge(left_prev, &Arc::new(right.clone()))),
            left_params.to_vec(),
        ),
        (None, Some((right_prev, right_params))) => Node::QueryParams(
            Arc::new(merge(&Arc::new(left.clone()), right_prev)),
            right_params.to_vec(),
        ),
        (None, None) => Node::Concat(Arc::new(left.clone()), Arc::new(right.clone())),
    }
}

/// Drops an empty left operand so `/` never leaves a stray separator behind
fn merge(left: &Arc<Node>, right: &Arc<Node>) -> Node {
    if left.is_empty_literal() {
        (**right).clone()
    } else {
        Node::Concat(Arc::clone(left), Arc::clone(right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::QueryParam;
    use crate::parse;
    use pretty_assertions::assert_eq;

    fn keys(node: &Node) -> Vec<String> {
        let (_, params) = node.as_query_params().unwrap();
        params.iter().map(|p| p.key.clone()).collect()
    }

    #[test]
    fn test_concat_plain_paths() {
        let node = concat(&parse("/users"), &parse("/:id"));
        assert_eq!(node, Node::concat(parse("/users"), parse("/:id")));
    }

    #[test]
    fn test_concat_left_query_only() {
        let node = concat(&parse("/users?page=:page"), &parse("/:id"));
        let (previous, _) = node.as_query_params().unwrap();
        assert_eq!(previous.to_path(), "/users/:id");
        assert_eq!(keys(&node), vec!["page"]);
    }

    #[test]
    fn test_concat_right_query_only() {
        let node = concat(&parse("/api"), &parse("/search?q=:q"));
        let (previous, _) = node.as_query_params().unwrap();
        assert_eq!(previous.to_path(), "/api/search");
        assert_eq!(keys(&node), vec!["q"]);
    }

    #[test]
    fn test_concat_root_query_is_dropped_from_path() {
        let node = concat(&parse("/?lang=:lang"), &parse("/docs"));
        let (previous, _) = node.as_query_params().unwrap();
        assert_eq!(**previous, parse("/docs"));
    }

    #[test]
    fn test_concat_query_key_conflict_right_wins() {
        let node = concat(
            &parse("/a?x=:x1&y=:y&z=:z"),
            &parse("/b?w=:w&x=:x2"),
        );
        assert_eq!(keys(&node), vec!["y", "z", "w", "x"]);

        let (_, params) = node.as_query_params().unwrap();
        let x = params.iter().find(|p| p.key == "x").unwrap();
        assert_eq!(*x, QueryParam::new("x", Node::param("x2")));
    }

    #[test]
    fn test_concat_does_not_touch_operands() {
        let left = parse("/a?x=:x");
        let right = parse("/b?x=:y");
        let before = (left.clone(), right.clone());
        let _ = concat(&left, &right);
        assert_eq!((left, right), before);
    }
}
