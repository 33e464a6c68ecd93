//! Structural matching
//!
//! Walks the groups of a [`Plan`] over the path segments, left to right, with
//! no backtracking. Repetition is greedy: it takes every remaining segment.

use std::slice;

use tracing::{debug, warn};

use super::{Capture, Group, Plan, QueryStep, Step};
use crate::ast::Node;
use crate::params::{ParamMap, ParamValue, QueryMap};

/// Compiled matcher for one pattern
///
/// # Examples
///
/// ```
/// use routeplex::compile::Matcher;
/// use routeplex::params::QueryMap;
/// use routeplex::parse;
///
/// let matcher = Matcher::compile(&parse("/users/:id"), true);
/// let params = matcher.match_parts(&["users", "42"], &QueryMap::new()).unwrap();
/// assert_eq!(params.get_str("id"), Some("42"));
/// assert!(matcher.match_parts(&["users", "42", "posts"], &QueryMap::new()).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Matcher {
    plan: Plan,
    end: bool,
}

impl Matcher {
    /// Compiles `node`; with `end`, leftover segments reject the match
    pub fn compile(node: &Node, end: bool) -> Self {
        let plan = Plan::build(node);
        debug!(
            pattern = %node,
            groups = plan.groups.len(),
            query = plan.query.is_some(),
            end,
            "compiled matcher"
        );
        if plan.has_non_terminal_repetition() {
            warn!(
                pattern = %node,
                "repetition before the last path group takes every remaining segment"
            );
        }
        Self { plan, end }
    }

    /// Matches pre-split path segments and a parsed query
    ///
    /// Returns `None` on a structural mismatch. Undeclared query keys are
    /// ignored.
    pub fn match_parts(&self, segments: &[&str], query: &QueryMap) -> Option<ParamMap> {
        let mut params = ParamMap::new();
        let mut cursor = Cursor::new(segments);

        for group in &self.plan.groups {
            cursor = match_group(group, cursor, &mut params)?;
        }
        if self.end && !cursor.is_done() {
            return None;
        }
        if let Some(entries) = &self.plan.query {
            if !match_query(entries, query, &mut params) {
                return None;
            }
        }
        Some(params)
    }

    pub fn captures(&self) -> Vec<&Capture> {
        self.plan.captures()
    }

    pub fn requires_full_consumption(&self) -> bool {
        self.end
    }

    /// Whether a greedy repetition sits before the last path group
    pub fn has_non_terminal_repetition(&self) -> bool {
        self.plan.has_non_terminal_repetition()
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }
}

// ============================================================================
// Cursor
// ============================================================================

/// Position in the segment slice, plus a byte offset into the front segment
/// once a prefix has been stripped from it
#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
    segments: &'a [&'a str],
    index: usize,
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(segments: &'a [&'a str]) -> Self {
        Self {
            segments,
            index: 0,
            offset: 0,
        }
    }

    fn front(&self) -> Option<&'a str> {
        self.segments.get(self.index).map(|segment| &segment[self.offset..])
    }

    /// Front segment followed by every later one
    fn remaining(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.front()
            .into_iter()
            .chain(self.segments.iter().skip(self.index + 1).copied())
    }

    fn advance(self) -> Self {
        Self {
            index: self.index + 1,
            offset: 0,
            ..self
        }
    }

    fn strip(self, len: usize) -> Self {
        Self {
            offset: self.offset + len,
            ..self
        }
    }

    fn finish(self) -> Self {
        Self {
            index: self.segments.len(),
            offset: 0,
            ..self
        }
    }

    fn position(&self) -> (usize, usize) {
        (self.index, self.offset)
    }

    fn is_done(&self) -> bool {
        self.index >= self.segments.len()
    }
}

// ============================================================================
// Path Matching
// ============================================================================

fn match_group<'a>(group: &Group, cursor: Cursor<'a>, params: &mut ParamMap) -> Option<Cursor<'a>> {
    match group.as_slice() {
        [step] => match_step(step, cursor, params),
        steps => match_compound(steps, cursor, params),
    }
}

fn match_step<'a>(step: &Step, cursor: Cursor<'a>, params: &mut ParamMap) -> Option<Cursor<'a>> {
    match step {
        Step::Literal(text) => (cursor.front()? == text.as_str()).then(|| cursor.advance()),
        Step::Capture(capture) if capture.multiple => {
            let values: Vec<String> = cursor
                .remaining()
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect();
            if values.is_empty() && !capture.optional {
                return None;
            }
            params.insert(capture.key.clone(), ParamValue::Multiple(values));
            Some(cursor.finish())
        }
        Step::Capture(capture) => match cursor.front().filter(|segment| !segment.is_empty()) {
            Some(value) => {
                params.insert(capture.key.clone(), value);
                Some(cursor.advance())
            }
            None if capture.optional => Some(cursor),
            None => None,
        },
        Step::Prefix(text, inner) => match cursor.front() {
            Some(front) if front.starts_with(text.as_str()) => {
                let stripped = cursor.strip(text.len());
                let next = match_step(inner, stripped, params)?;
                if next.position() == stripped.position() {
                    Some(cursor.advance())
                } else {
                    Some(next)
                }
            }
            _ if inner.is_optional() => Some(cursor),
            _ => None,
        },
        Step::Optional(inner) => {
            let mut scratch = params.clone();
            match match_step(inner, cursor, &mut scratch) {
                Some(next) => {
                    *params = scratch;
                    Some(next)
                }
                None => Some(cursor),
            }
        }
        Step::Repeat { inner, min } => {
            let mut cursor = cursor;
            let mut count = 0;
            while !cursor.is_done() {
                let mut scratch = params.clone();
                match match_step(inner, cursor, &mut scratch) {
                    Some(next) if next.position() != cursor.position() => {
                        *params = scratch;
                        cursor = next;
                        count += 1;
                    }
                    _ => break,
                }
            }
            (count >= *min).then_some(cursor)
        }
        Step::Sequence(steps) => match_compound(steps, cursor, params),
    }
}

/// Matches several steps against the front segment; the whole segment must be used
fn match_compound<'a>(steps: &[Step], cursor: Cursor<'a>, params: &mut ParamMap) -> Option<Cursor<'a>> {
    let text = cursor.front().unwrap_or("");
    let consumed = match_within(steps, text, None, params)?;
    if consumed != text.len() {
        return None;
    }
    Some(if cursor.front().is_some() {
        cursor.advance()
    } else {
        cursor
    })
}

/// Runs `steps` over `text`; returns the number of bytes consumed
///
/// A capture stops at the first occurrence of the next step's anchor, or at
/// `follow` for the last step.
fn match_within(steps: &[Step], text: &str, follow: Option<&str>, params: &mut ParamMap) -> Option<usize> {
    let mut pos = 0;
    for (index, step) in steps.iter().enumerate() {
        let anchor = match steps.get(index + 1) {
            Some(next) => next.anchor(),
            None => follow,
        };
        pos = match_in(step, text, pos, anchor, params)?;
    }
    Some(pos)
}

fn match_in(step: &Step, text: &str, pos: usize, anchor: Option<&str>, params: &mut ParamMap) -> Option<usize> {
    let rest = &text[pos..];
    match step {
        Step::Literal(literal) => rest.starts_with(literal.as_str()).then(|| pos + literal.len()),
        Step::Capture(capture) => {
            let end = anchor
                .and_then(|anchor| rest.find(anchor))
                .unwrap_or(rest.len());
            let value = &rest[..end];
            match (value.is_empty(), capture.multiple) {
                (true, _) if !capture.optional => return None,
                (true, true) => params.insert(capture.key.clone(), ParamValue::Multiple(Vec::new())),
                (true, false) => {}
                (false, true) => params.insert(capture.key.clone(), vec![value.to_string()]),
                (false, false) => params.insert(capture.key.clone(), value),
            }
            Some(pos + end)
        }
        Step::Prefix(prefix, inner) => {
            if rest.starts_with(prefix.as_str()) {
                match_in(inner, text, pos + prefix.len(), anchor, params)
            } else if inner.is_optional() {
                Some(pos)
            } else {
                None
            }
        }
        Step::Optional(inner) => {
            let mut scratch = params.clone();
            match match_in(inner, text, pos, anchor, &mut scratch) {
                Some(next) => {
                    *params = scratch;
                    Some(next)
                }
                None => Some(pos),
            }
        }
        Step::Repeat { inner, min } => {
            let mut pos = pos;
            let mut count = 0;
            while pos < text.len() {
                let mut scratch = params.clone();
                match match_in(inner, text, pos, anchor, &mut scratch) {
                    Some(next) if next != pos => {
                        *params = scratch;
                        pos = next;
                        count += 1;
                    }
                    _ => break,
                }
            }
            (count >= *min).then_some(pos)
        }
        Step::Sequence(steps) => match_within(steps, rest, anchor, params).map(|used| pos + used),
    }
}

// ============================================================================
// Query Matching
// ============================================================================

fn match_query(entries: &[QueryStep], query: &QueryMap, params: &mut ParamMap) -> bool {
    entries
        .iter()
        .all(|entry| match_values(&entry.step, query.get_all(&entry.key), params))
}

/// Matches the values given for one query key
fn match_values(step: &Step, values: &[String], params: &mut ParamMap) -> bool {
    match step {
        Step::Literal(literal) => matches!(values, [value] if value == literal),
        Step::Capture(capture) if capture.multiple => {
            let values: Vec<String> = values.iter().filter(|v| !v.is_empty()).cloned().collect();
            if values.is_empty() && !capture.optional {
                return false;
            }
            params.insert(capture.key.clone(), ParamValue::Multiple(values));
            true
        }
        Step::Capture(capture) => match values.iter().find(|v| !v.is_empty()) {
            Some(value) => {
                params.insert(capture.key.clone(), value.clone());
                true
            }
            None => capture.optional,
        },
        Step::Prefix(prefix, inner) => {
            let stripped: Option<Vec<String>> = values
                .iter()
                .map(|value| value.strip_prefix(prefix.as_str()).map(str::to_string))
                .collect();
            match stripped {
                Some(stripped) => match_values(inner, &stripped, params),
                None => false,
            }
        }
        Step::Optional(inner) => values.is_empty() || match_values(inner, values, params),
        Step::Repeat { inner, min } => {
            values.len() >= *min
                && values
                    .iter()
                    .all(|value| match_values(inner, slice::from_ref(value), params))
        }
        Step::Sequence(steps) => match values {
            [] => steps.iter().all(Step::is_optional),
            [value] => match_within(steps, value, None, params) == Some(value.len()),
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;
    use crate::parse;
    use pretty_assertions::assert_eq;

    fn run(pattern: &str, end: bool, path: &[&str], query: &str) -> Option<ParamMap> {
        Matcher::compile(&parse(pattern), end).match_parts(path, &QueryMap::parse(query))
    }

    fn single(pairs: &[(&str, &str)]) -> ParamMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_static_match() {
        assert_eq!(run("/about", true, &["about"], ""), Some(ParamMap::new()));
        assert_eq!(run("/about", true, &["contact"], ""), None);
        assert_eq!(run("/", true, &[], ""), Some(ParamMap::new()));
        assert_eq!(run("/", true, &["x"], ""), None);
    }

    #[test]
    fn test_end_flag() {
        assert_eq!(
            run("/articles/:slug", true, &["articles", "123"], ""),
            Some(single(&[("slug", "123")]))
        );
        assert_eq!(run("/articles/:slug", true, &["articles", "123", "comments"], ""), None);
        assert_eq!(
            run("/articles/:slug", false, &["articles", "123", "comments"], ""),
            Some(single(&[("slug", "123")]))
        );
    }

    #[test]
    fn test_optional_param() {
        assert_eq!(run("/posts/:id?", true, &["posts"], ""), Some(ParamMap::new()));
        assert_eq!(
            run("/posts/:id?", true, &["posts", "7"], ""),
            Some(single(&[("id", "7")]))
        );
    }

    #[test]
    fn test_repetition_is_greedy() {
        let params = run("/files/:path+", true, &["files", "a", "b", "c"], "").unwrap();
        assert_eq!(params.get("path"), Some(&ParamValue::from(vec!["a", "b", "c"])));
        assert_eq!(run("/files/:path+", true, &["files"], ""), None);

        let params = run("/files/:path*", true, &["files"], "").unwrap();
        assert_eq!(params.get("path"), Some(&ParamValue::Multiple(vec![])));
    }

    #[test]
    fn test_non_terminal_repetition_starves_later_groups() {
        let matcher = Matcher::compile(&parse("/:rest+/edit"), true);
        assert!(matcher.has_non_terminal_repetition());
        assert_eq!(matcher.match_parts(&["a", "edit"], &QueryMap::new()), None);
    }

    #[test]
    fn test_unnamed_params() {
        let params = run("/*/to/*", true, &["from", "to", "there"], "").unwrap();
        assert_eq!(params.get_index(0), Some(&ParamValue::from("from")));
        assert_eq!(params.get_index(1), Some(&ParamValue::from("there")));
    }

    #[test]
    fn test_prefix() {
        assert_eq!(run("/{user-:id}", true, &["user-123"], ""), Some(single(&[("id", "123")])));
        assert_eq!(run("/{user-:id}", true, &["123"], ""), None);
        assert_eq!(run("/{user-:id}", true, &["user-"], ""), None);
    }

    #[test]
    fn test_optional_prefix() {
        assert_eq!(run("/{v:n?}", true, &[], ""), Some(ParamMap::new()));
        assert_eq!(run("/{v:n?}", true, &["v2"], ""), Some(single(&[("n", "2")])));
        assert_eq!(run("/{v:n?}", true, &["v"], ""), Some(ParamMap::new()));
    }

    #[test]
    fn test_compound_segment() {
        assert_eq!(
            run("/:name.:ext", true, &["report.pdf"], ""),
            Some(single(&[("name", "report"), ("ext", "pdf")]))
        );
        assert_eq!(
            run("/v:version/docs", true, &["v2", "docs"], ""),
            Some(single(&[("version", "2")]))
        );
        assert_eq!(run("/:name.json", true, &["report.xml"], ""), None);
        assert_eq!(run("/v:version", true, &["v"], ""), None);
    }

    #[test]
    fn test_query_params() {
        let pattern = "/search?q=:query&page=:page?";
        assert_eq!(
            run(pattern, true, &["search"], "q=test"),
            Some(single(&[("query", "test")]))
        );
        assert_eq!(run(pattern, true, &["search"], ""), None);
        assert_eq!(
            run(pattern, true, &["search"], "q=test&page=2&extra=1"),
            Some(single(&[("query", "test"), ("page", "2")]))
        );
    }

    #[test]
    fn test_query_literal_and_lists() {
        assert!(run("/?sort=asc", true, &[], "sort=asc").is_some());
        assert!(run("/?sort=asc", true, &[], "sort=desc").is_none());
        assert!(run("/?sort=asc", true, &[], "sort=asc&sort=asc").is_none());

        let params = run("/?tag=:tags*", true, &[], "tag=a&tag=b").unwrap();
        assert_eq!(params.get("tags"), Some(&ParamValue::from(vec!["a", "b"])));
        let params = run("/?tag=:tags*", true, &[], "").unwrap();
        assert_eq!(params.get("tags"), Some(&ParamValue::Multiple(vec![])));
    }

    #[test]
    fn test_query_prefix_strips_every_value() {
        let params = run("/?id={u-:ids+}", true, &[], "id=u-1&id=u-2").unwrap();
        assert_eq!(params.get("ids"), Some(&ParamValue::from(vec!["1", "2"])));
        assert!(run("/?id={u-:ids+}", true, &[], "id=u-1&id=2").is_none());
    }

    #[test]
    fn test_query_values_are_decoded() {
        let params = run("/search?q=:q", true, &["search"], "q=hello%20world").unwrap();
        assert_eq!(params.get_str("q"), Some("hello world"));
    }

    #[test]
    fn test_schema_does_not_affect_matching() {
        let schema = crate::schema::Schema::new(crate::schema::Constraint::Int);
        let node = parse("/users/:id").with_param_schema("id", &schema);
        let matcher = Matcher::compile(&node, true);
        let params = matcher.match_parts(&["users", "abc"], &QueryMap::new()).unwrap();
        assert_eq!(params.get_str("id"), Some("abc"));
    }

    #[test]
    fn test_optional_literal() {
        let node = Node::concat(
            Node::literal("/posts"),
            Node::concat(Node::literal("/"), Node::optional(Node::literal("edit"))),
        );
        let matcher = Matcher::compile(&node, true);
        assert!(matcher.match_parts(&["posts"], &QueryMap::new()).is_some());
        assert!(matcher.match_parts(&["posts", "edit"], &QueryMap::new()).is_some());
        assert!(matcher.match_parts(&["posts", "view"], &QueryMap::new()).is_none());
    }
}
