//! Captured parameters and query multimaps

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Key of a captured value: a parameter name or the position of an unnamed capture
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamKey {
    Named(String),
    Index(usize),
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Named(name) => f.write_str(name),
            ParamKey::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Named(name.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::Named(name)
    }
}

impl From<usize> for ParamKey {
    fn from(index: usize) -> Self {
        ParamKey::Index(index)
    }
}

/// A captured value: one segment, or a list for repeated captures
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Multiple(Vec<String>),
}

impl ParamValue {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            ParamValue::Single(value) => Some(value),
            ParamValue::Multiple(_) => None,
        }
    }

    pub fn as_multiple(&self) -> Option<&[String]> {
        match self {
            ParamValue::Single(_) => None,
            ParamValue::Multiple(values) => Some(values),
        }
    }

    /// An empty string or an empty list
    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::Single(value) => value.is_empty(),
            ParamValue::Multiple(values) => values.is_empty(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multiple(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// Parameters produced by a match and consumed by interpolation
///
/// # Examples
///
/// ```
/// use routeplex::params::{ParamMap, ParamValue};
///
/// let params: ParamMap = [("id", "42")].into_iter().collect();
/// assert_eq!(params.get_str("id"), Some("42"));
/// assert_eq!(params.get("id"), Some(&ParamValue::Single("42".to_string())));
/// assert_eq!(params.get("missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap(BTreeMap<ParamKey, ParamValue>);

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(&ParamKey::Named(name.to_string()))
    }

    /// Shortcut for single-valued named captures
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_single)
    }

    pub fn get_index(&self, index: usize) -> Option<&ParamValue> {
        self.0.get(&ParamKey::Index(index))
    }

    pub fn get_key(&self, key: &ParamKey) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<ParamKey>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn extend(&mut self, other: ParamMap) {
        self.0.extend(other.0);
    }

    pub fn contains_key(&self, key: &ParamKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &ParamValue)> {
        self.0.iter()
    }
}

impl<K: Into<ParamKey>, V: Into<ParamValue>> FromIterator<(K, V)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl IntoIterator for ParamMap {
    type Item = (ParamKey, ParamValue);
    type IntoIter = std::collections::btree_map::IntoIter<ParamKey, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ============================================================================
// Query Multimap
// ============================================================================

/// Query string values grouped by key, in input order
///
/// # Examples
///
/// ```
/// use routeplex::params::QueryMap;
///
/// let query = QueryMap::parse("tag=a&tag=b&q=hello+world&empty");
/// assert_eq!(query.get_all("tag"), ["a", "b"]);
/// assert_eq!(query.get_all("q"), ["hello world"]);
/// assert_eq!(query.get_all("empty"), [""]);
/// assert!(query.get_all("missing").is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap(BTreeMap<String, Vec<String>>);

impl QueryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `a=1&b=2` with form-style decoding (`+` is a space, `%XX` escapes)
    pub fn parse(query: &str) -> Self {
        query
            .split('&')
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
                (decode_component(key), decode_component(value))
            })
            .collect()
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = QueryMap::new();
        for (key, value) in iter {
            map.append(key, value);
        }
        map
    }
}

fn decode_component(raw: &str) -> String {
    let spaced: Cow<'_, str> = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced.into_owned(),
    }
}

/// Percent-decodes one path segment; `+` stays literal outside the query
pub(crate) fn decode_segment(raw: &str) -> Cow<'_, str> {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(raw),
    }
}

/// Percent-encodes a captured value or query key for rendering
pub(crate) fn encode_component(raw: &str) -> Cow<'_, str> {
    urlencoding::encode(raw)
}
