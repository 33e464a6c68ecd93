/// Token classification for pattern segments
///
/// Pure functional scanning of one raw path segment (or one query value) into
/// typed tokens. All functions are **pure**: same input → same output, no side effects.

use thiserror::Error;

use crate::ast::Node;

/// Malformed pattern text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("unterminated `{{` in pattern segment `{segment}`")]
    UnterminatedPrefix { segment: String },
    #[error("prefix `{{{body}}}` in `{segment}` has no `:name` or `:*` capture")]
    PrefixWithoutCapture { segment: String, body: String },
    #[error("invalid capture `{capture}` in prefix of `{segment}`")]
    InvalidPrefixCapture { segment: String, capture: String },
    #[error("missing parameter name after `:` in `{segment}`")]
    MissingParamName { segment: String },
}

/// Repetition suffix of a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// No suffix
    One,
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl Modifier {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '?' => Some(Modifier::Optional),
            '*' => Some(Modifier::ZeroOrMore),
            '+' => Some(Modifier::OneOrMore),
            _ => None,
        }
    }

    fn wrap(self, node: Node) -> Node {
        match self {
            Modifier::One => node,
            Modifier::Optional => Node::optional(node),
            Modifier::ZeroOrMore => Node::zero_or_more(node),
            Modifier::OneOrMore => Node::one_or_more(node),
        }
    }
}

/// Represents the different tokens a pattern segment is made of
///
/// Functional sum type mirroring the capture syntax.
///
/// # Examples
///
/// ```
/// use routeplex::route::pattern::{tokenize_segment, Modifier, Token};
///
/// let tokens = tokenize_segment("v:version+").unwrap();
/// assert_eq!(
///     tokens,
///     vec![
///         Token::Literal("v".to_string()),
///         Token::Named("version".to_string(), Modifier::OneOrMore),
///     ]
/// );
///
/// let tokens = tokenize_segment("{user-:id}").unwrap();
/// assert!(matches!(tokens[0], Token::Prefix(_, _)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Static text: `about`
    Literal(String),
    /// Named capture: `:id`, `:id?`, `:rest*`, `:rest+`
    Named(String, Modifier),
    /// Unnamed capture: `*`, `*?`, `**`, `*+`
    Wildcard(Modifier),
    /// Prefixed capture: `{user-:id}` or `{v:*}`; the inner token is a capture
    Prefix(String, Box<Token>),
}

impl Token {
    pub fn into_node(self) -> Node {
        match self {
            Token::Literal(text) => Node::literal(text),
            Token::Named(name, modifier) => modifier.wrap(Node::param(name)),
            Token::Wildcard(modifier) => modifier.wrap(Node::unnamed()),
            Token::Prefix(text, inner) => Node::prefix(text, inner.into_node()),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Splits `name` off the front of `rest`
fn take_name(rest: &str) -> (&str, &str) {
    let end = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
    rest.split_at(end)
}

/// Splits an optional modifier off the front of `rest`
fn take_modifier(rest: &str) -> (Modifier, &str) {
    match rest.chars().next().and_then(Modifier::from_char) {
        Some(modifier) => (modifier, &rest[1..]),
        None => (Modifier::One, rest),
    }
}

/// Parses the capture part of a `{prefix:capture}` token
fn parse_prefix(body: &str, segment: &str) -> Result<Token, PatternError> {
    let (text, capture) = body
        .rsplit_once(':')
        .ok_or_else(|| PatternError::PrefixWithoutCapture {
            segment: segment.to_string(),
            body: body.to_string(),
        })?;

    let inner = match capture.strip_prefix('*') {
        Some(rest) => {
            let (modifier, rest) = take_modifier(rest);
            (rest.is_empty()).then_some(Token::Wildcard(modifier))
        }
        None => {
            let (name, rest) = take_name(capture);
            let (modifier, rest) = take_modifier(rest);
            (!name.is_empty() && rest.is_empty()).then(|| Token::Named(name.to_string(), modifier))
        }
    };

    match inner {
        Some(inner) => Ok(Token::Prefix(text.to_string(), Box::new(inner))),
        _ => Err(PatternError::InvalidPrefixCapture {
            segment: segment.to_string(),
            capture: capture.to_string(),
        }),
    }
}

/// Splits one raw segment into tokens (pure function)
///
/// **Pure functional scanner**: Maps segment text → `Vec<Token>`.
///
/// # Scanning Rules
///
/// 1. **Prefix**: `{text:name}` or `{text:*}`, with an optional modifier after the capture
/// 2. **Named capture**: `:name` followed by an optional `?`, `*` or `+`
/// 3. **Wildcard**: `*` followed by an optional `?`, `*` or `+`
/// 4. **Literal**: every other run of characters
///
/// A parameter name is a run of alphanumeric characters or `_`, so `:id.json`
/// yields a capture followed by the literal `.json`.
pub fn tokenize_segment(segment: &str) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = segment;

    while let Some(c) = rest.chars().next() {
        match c {
            '{' => {
                flush_literal(&mut literal, &mut tokens);
                let close = rest.find('}').ok_or_else(|| PatternError::UnterminatedPrefix {
                    segment: segment.to_string(),
                })?;
                tokens.push(parse_prefix(&rest[1..close], segment)?);
                rest = &rest[close + 1..];
            }
            ':' => {
                flush_literal(&mut literal, &mut tokens);
                let (name, after) = take_name(&rest[1..]);
                if name.is_empty() {
                    return Err(PatternError::MissingParamName {
                        segment: segment.to_string(),
                    });
                }
                let (modifier, after) = take_modifier(after);
                tokens.push(Token::Named(name.to_string(), modifier));
                rest = after;
            }
            '*' => {
                flush_literal(&mut literal, &mut tokens);
                let (modifier, after) = take_modifier(&rest[1..]);
                tokens.push(Token::Wildcard(modifier));
                rest = after;
            }
            _ => {
                literal.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    flush_literal(&mut literal, &mut tokens);
    Ok(tokens)
}

fn flush_literal(literal: &mut String, tokens: &mut Vec<Token>) {
    if !literal.is_empty() {
        tokens.push(Token::Literal(std::mem::take(literal)));
    }
}

/// Byte offset of the `?` that starts the query part, if any
///
/// A `?` directly after a capture (`:id?`, `*?`) is a modifier, not the query
/// separator. Modifiers of a prefixed capture go inside the braces (`{v:n?}`).
///
/// # Examples
///
/// ```
/// use routeplex::route::pattern::find_query_start;
///
/// assert_eq!(find_query_start("/search?q=:q"), Some(7));
/// assert_eq!(find_query_start("/posts/:id?"), None);
/// assert_eq!(find_query_start("/posts/:id??sort=:s"), Some(11));
/// ```
pub fn find_query_start(pattern: &str) -> Option<usize> {
    let mut after_capture = false;
    let mut in_name = false;
    let mut in_braces = false;

    for (index, c) in pattern.char_indices() {
        if in_braces {
            if c == '}' {
                in_braces = false;
            }
            continue;
        }
        if in_name && is_name_char(c) {
            continue;
        }
        in_name = false;

        match c {
            '?' if after_capture => after_capture = false,
            '?' => return Some(index),
            ':' => {
                in_name = true;
                after_capture = true;
            }
            '*' => after_capture = true,
            '{' => in_braces = true,
            _ => after_capture = false,
        }
    }
    None
}
