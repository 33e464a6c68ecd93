//! Typed decoding and encoding through a route
//!
//! Values travel as a JSON object keyed by parameter key (`"0"`, `"1"` for
//! unnamed captures). Captures without a schema decode to strings, or to
//! arrays of strings for repeated captures.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::compile::Capture;
use crate::params::{ParamMap, ParamValue};
use crate::schema::Issue;
use crate::Route;

/// A matched route whose values were rejected by a schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot decode `{route}`: {issue}")]
pub struct DecodeError {
    pub route: String,
    pub issue: Issue,
}

/// A value that cannot be rendered through a route
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot encode `{route}`: {issue}")]
pub struct EncodeError {
    pub route: String,
    pub issue: Issue,
}

/// Matches `raw` and decodes the captured values
///
/// `Ok(None)` means the route did not match; an error means it matched but a
/// schema rejected a value.
///
/// # Examples
///
/// ```
/// use routeplex::schema::{Constraint, Schema};
/// use routeplex::{codec, parse, Route};
/// use serde_json::json;
///
/// let ast = parse("/users/:id").with_param_schema("id", &Schema::new(Constraint::Int));
/// let route = Route::new(ast).with_end(true);
///
/// assert_eq!(codec::decode(&route, "/users/42").unwrap(), Some(json!({ "id": 42 })));
/// assert_eq!(codec::decode(&route, "/posts/42").unwrap(), None);
/// assert!(codec::decode(&route, "/users/abc").is_err());
/// ```
pub fn decode(route: &Route, raw: &str) -> Result<Option<Value>, DecodeError> {
    match route.matches(raw) {
        Some(params) => decode_params(route, &params).map(Some),
        None => Ok(None),
    }
}

/// Decodes an already matched parameter map
pub fn decode_params(route: &Route, params: &ParamMap) -> Result<Value, DecodeError> {
    let mut out = Map::new();
    for capture in route.matcher().captures() {
        let name = capture.key.to_string();
        if out.contains_key(&name) {
            continue;
        }
        let Some(raw) = params.get_key(&capture.key) else {
            continue;
        };
        let value = decode_value(capture, raw).map_err(|issue| DecodeError {
            route: route.path().to_string(),
            issue: issue.at(name.clone()),
        })?;
        out.insert(name, value);
    }
    Ok(Value::Object(out))
}

fn decode_value(capture: &Capture, raw: &ParamValue) -> Result<Value, Issue> {
    match &capture.schema {
        Some(schema) => schema.decode(raw),
        None => Ok(match raw {
            ParamValue::Single(value) => Value::String(value.clone()),
            ParamValue::Multiple(values) => values.iter().cloned().map(Value::String).collect(),
        }),
    }
}

/// Encodes a JSON object and renders the route from it
///
/// # Examples
///
/// ```
/// use routeplex::{codec, Route};
/// use serde_json::json;
///
/// let route = Route::parse("/files/:path+");
/// let rendered = codec::encode(&route, &json!({ "path": ["a", "b"] })).unwrap();
/// assert_eq!(rendered, "/files/a/b");
///
/// assert!(codec::encode(&route, &json!({})).is_err());
/// ```
pub fn encode(route: &Route, value: &Value) -> Result<String, EncodeError> {
    let fail = |issue: Issue| EncodeError {
        route: route.path().to_string(),
        issue,
    };
    let object = value
        .as_object()
        .ok_or_else(|| fail(Issue::invalid_type(format!("expected an object, got {value}"))))?;

    let mut params = ParamMap::new();
    for capture in route.matcher().captures() {
        if params.contains_key(&capture.key) {
            continue;
        }
        let name = capture.key.to_string();
        let encoded = match object.get(&name) {
            None | Some(Value::Null) => None,
            Some(value) => Some(encode_value(capture, value).map_err(|issue| fail(issue.at(name.clone())))?),
        };
        match encoded {
            Some(encoded) if !encoded.is_empty() => params.insert(capture.key.clone(), encoded),
            _ if capture.optional => {}
            _ => return Err(fail(Issue::missing("value is required").at(name))),
        }
    }
    Ok(route.interpolate(&params))
}

fn encode_value(capture: &Capture, value: &Value) -> Result<ParamValue, Issue> {
    let encoded = match &capture.schema {
        Some(schema) => schema.encode(value)?,
        None => match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| scalar_text(item).map_err(|issue| issue.at(index.to_string())))
                .collect::<Result<Vec<_>, _>>()
                .map(ParamValue::Multiple)?,
            other => scalar_text(other).map(ParamValue::Single)?,
        },
    };

    // The value's shape must follow the capture: lists only for repetitions
    match encoded {
        ParamValue::Multiple(_) if !capture.multiple => {
            Err(Issue::invalid_type(format!("expected a single value, got {value}")))
        }
        ParamValue::Single(text) if capture.multiple && !text.is_empty() => {
            Ok(ParamValue::Multiple(vec![text]))
        }
        encoded => Ok(encoded),
    }
}

fn scalar_text(value: &Value) -> Result<String, Issue> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(Issue::invalid_type(format!("expected a scalar, got {other}"))),
    }
}
