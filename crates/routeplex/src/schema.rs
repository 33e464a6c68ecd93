//! Value schemas attached to captures
//!
//! The engine itself only moves strings around. A [`Schema`] attached with
//! [`Node::WithSchema`](crate::ast::Node::WithSchema) turns a captured
//! [`ParamValue`] into a typed JSON value and back; the engine treats it as a
//! black box and only reports the [`Issue`] it returns.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::params::ParamValue;

// ============================================================================
// Issues
// ============================================================================

/// Category of a validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A required value is absent
    Missing,
    /// The value has the wrong shape (e.g. a list where a string is expected)
    InvalidType,
    /// The value has the right shape but is rejected
    InvalidValue,
    /// Raised by a custom schema
    Custom,
}

/// A structured, field-addressable validation failure
///
/// `path` addresses the failing field from the outside in: the parameter key
/// first, then list indices for repeated captures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub path: Vec<String>,
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            kind,
            message: message.into(),
        }
    }

    pub fn missing(message: impl Into<String>) -> Self {
        Self::new(IssueKind::Missing, message)
    }

    pub fn invalid_type(message: impl Into<String>) -> Self {
        Self::new(IssueKind::InvalidType, message)
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::new(IssueKind::InvalidValue, message)
    }

    /// Prepends a path segment, moving the issue one level out
    pub fn at(mut self, segment: impl Into<String>) -> Self {
        self.path.insert(0, segment.into());
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path.join("."), self.message)
        }
    }
}

// ============================================================================
// Schema Trait
// ============================================================================

/// Converts captured strings into typed values and back
pub trait ParamSchema: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &str;

    fn decode(&self, raw: &ParamValue) -> Result<Value, Issue>;

    fn encode(&self, value: &Value) -> Result<ParamValue, Issue>;
}

/// Shared handle to a [`ParamSchema`]
///
/// Two handles are equal only when they point at the same schema instance.
#[derive(Clone)]
pub struct Schema(Arc<dyn ParamSchema>);

impl Schema {
    pub fn new(schema: impl ParamSchema + 'static) -> Self {
        Self(Arc::new(schema))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn decode(&self, raw: &ParamValue) -> Result<Value, Issue> {
        self.0.decode(raw)
    }

    pub fn encode(&self, value: &Value) -> Result<ParamValue, Issue> {
        self.0.encode(value)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Schema").field(&self.name()).finish()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// ============================================================================
// Built-in Constraints
// ============================================================================

/// Built-in schemas for common parameter shapes
///
/// `Int`, `UInt` and `Bool` decode to JSON numbers and booleans; the others
/// validate the text and keep it as a string. Repeated captures are checked
/// element by element.
///
/// # Examples
///
/// ```
/// use routeplex::params::ParamValue;
/// use routeplex::schema::{Constraint, ParamSchema};
/// use serde_json::json;
///
/// assert_eq!(Constraint::Int.decode(&ParamValue::from("-7")).unwrap(), json!(-7));
/// assert!(Constraint::UInt.decode(&ParamValue::from("-7")).is_err());
/// assert_eq!("slug".parse::<Constraint>().unwrap(), Constraint::Slug);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Any,
    Int,
    UInt,
    Bool,
    Alpha,
    AlphaNum,
    Slug,
    Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown parameter constraint `{0}`")]
pub struct UnknownConstraint(pub String);

impl FromStr for Constraint {
    type Err = UnknownConstraint;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "any" => Ok(Constraint::Any),
            "int" => Ok(Constraint::Int),
            "uint" => Ok(Constraint::UInt),
            "bool" => Ok(Constraint::Bool),
            "alpha" => Ok(Constraint::Alpha),
            "alphanum" => Ok(Constraint::AlphaNum),
            "slug" => Ok(Constraint::Slug),
            "uuid" => Ok(Constraint::Uuid),
            other => Err(UnknownConstraint(other.to_string())),
        }
    }
}

impl Constraint {
    fn decode_one(&self, raw: &str) -> Result<Value, Issue> {
        match self {
            Constraint::Int => raw
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| Issue::invalid_value(format!("`{raw}` is not an integer"))),
            Constraint::UInt => raw
                .parse::<u64>()
                .map(Value::from)
                .map_err(|_| Issue::invalid_value(format!("`{raw}` is not an unsigned integer"))),
            Constraint::Bool => match raw {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(Issue::invalid_value(format!("`{raw}` is not a boolean"))),
            },
            _ if self.accepts(raw) => Ok(Value::String(raw.to_string())),
            _ => Err(Issue::invalid_value(format!(
                "`{raw}` does not satisfy the {} constraint",
                self.name()
            ))),
        }
    }

    fn encode_one(&self, value: &Value) -> Result<String, Issue> {
        match (self, value) {
            (Constraint::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
            (Constraint::UInt, Value::Number(n)) if n.is_u64() => Ok(n.to_string()),
            (Constraint::Bool, Value::Bool(b)) => Ok(b.to_string()),
            (Constraint::Int | Constraint::UInt | Constraint::Bool, other) => Err(Issue::invalid_type(
                format!("expected {} value, got {other}", self.name()),
            )),
            (_, Value::String(text)) if self.accepts(text) => Ok(text.clone()),
            (_, Value::String(text)) => Err(Issue::invalid_value(format!(
                "`{text}` does not satisfy the {} constraint",
                self.name()
            ))),
            (_, other) => Err(Issue::invalid_type(format!("expected a string, got {other}"))),
        }
    }

    fn accepts(&self, raw: &str) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::Int => raw.parse::<i64>().is_ok(),
            Constraint::UInt => raw.parse::<u64>().is_ok(),
            Constraint::Bool => matches!(raw, "true" | "false"),
            Constraint::Alpha => !raw.is_empty() && raw.chars().all(char::is_alphabetic),
            Constraint::AlphaNum => !raw.is_empty() && raw.chars().all(char::is_alphanumeric),
            Constraint::Slug => {
                !raw.is_empty()
                    && raw
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
            }
            Constraint::Uuid => is_uuid(raw),
        }
    }
}

fn is_uuid(raw: &str) -> bool {
    let groups: Vec<&str> = raw.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit()))
}

impl ParamSchema for Constraint {
    fn name(&self) -> &str {
        match self {
            Constraint::Any => "any",
            Constraint::Int => "int",
            Constraint::UInt => "uint",
            Constraint::Bool => "bool",
            Constraint::Alpha => "alpha",
            Constraint::AlphaNum => "alphanum",
            Constraint::Slug => "slug",
            Constraint::Uuid => "uuid",
        }
    }

    fn decode(&self, raw: &ParamValue) -> Result<Value, Issue> {
        match raw {
            ParamValue::Single(text) => self.decode_one(text),
            ParamValue::Multiple(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| self.decode_one(item).map_err(|issue| issue.at(index.to_string())))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }

    fn encode(&self, value: &Value) -> Result<ParamValue, Issue> {
        match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| self.encode_one(item).map_err(|issue| issue.at(index.to_string())))
                .collect::<Result<Vec<_>, _>>()
                .map(ParamValue::Multiple),
            single => self.encode_one(single).map(ParamValue::Single),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constraint_from_str() {
        assert_eq!("int".parse::<Constraint>(), Ok(Constraint::Int));
        assert_eq!("uuid".parse::<Constraint>(), Ok(Constraint::Uuid));
        assert_eq!(
            "float".parse::<Constraint>(),
            Err(UnknownConstraint("float".to_string()))
        );
    }

    #[test]
    fn test_int_decode_and_encode() {
        let raw = ParamValue::from("123");
        assert_eq!(Constraint::Int.decode(&raw), Ok(json!(123)));
        assert_eq!(Constraint::Int.encode(&json!(123)), Ok(raw));

        let err = Constraint::Int.decode(&ParamValue::from("abc")).unwrap_err();
        assert_eq!(err.kind, IssueKind::InvalidValue);
    }

    #[test]
    fn test_int_encode_rejects_string() {
        let err = Constraint::Int.encode(&json!("12")).unwrap_err();
        assert_eq!(err.kind, IssueKind::InvalidType);
    }

    #[test]
    fn test_bool_constraint() {
        assert_eq!(Constraint::Bool.decode(&ParamValue::from("true")), Ok(json!(true)));
        assert!(Constraint::Bool.decode(&ParamValue::from("yes")).is_err());
        assert_eq!(Constraint::Bool.encode(&json!(false)), Ok(ParamValue::from("false")));
    }

    #[test]
    fn test_text_constraints() {
        assert!(Constraint::Alpha.accepts("hello"));
        assert!(!Constraint::Alpha.accepts("hello1"));
        assert!(Constraint::AlphaNum.accepts("abc123"));
        assert!(!Constraint::AlphaNum.accepts(""));
        assert!(Constraint::Slug.accepts("hello-world_2"));
        assert!(!Constraint::Slug.accepts("Hello"));
        assert!(Constraint::Uuid.accepts("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!Constraint::Uuid.accepts("550e8400-e29b-41d4-a716"));
    }

    #[test]
    fn test_list_issue_addresses_index() {
        let raw = ParamValue::from(vec!["1", "x", "3"]);
        let issue = Constraint::Int.decode(&raw).unwrap_err();
        assert_eq!(issue.path, vec!["1"]);

        let decoded = Constraint::Int.decode(&ParamValue::from(vec!["1", "2"])).unwrap();
        assert_eq!(decoded, json!([1, 2]));
    }

    #[test]
    fn test_issue_display_and_serialize() {
        let issue = Issue::invalid_value("bad").at("1").at("ids");
        assert_eq!(issue.to_string(), "ids.1: bad");

        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(
            json,
            json!({ "path": ["ids", "1"], "kind": "invalid_value", "message": "bad" })
        );
    }

    #[test]
    fn test_schema_equality_is_identity() {
        let a = Schema::new(Constraint::Int);
        let b = Schema::new(Constraint::Int);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(format!("{a:?}"), "Schema(\"int\")");
    }
}
