//! Rendering concrete strings from parameters

use std::borrow::Cow;

use tracing::debug;

use super::{Plan, QueryStep, Step};
use crate::ast::Node;
use crate::params::{encode_component, ParamMap, ParamValue};

/// Compiled renderer for one pattern
///
/// A pattern without captures compiles to its constant output.
///
/// # Examples
///
/// ```
/// use routeplex::compile::Interpolator;
/// use routeplex::params::ParamMap;
/// use routeplex::parse;
///
/// let about = Interpolator::compile(&parse("/about/"));
/// assert_eq!(about.as_literal(), Some("/about"));
///
/// let user = Interpolator::compile(&parse("/users/:id"));
/// let params: ParamMap = [("id", "42")].into_iter().collect();
/// assert_eq!(user.interpolate(&params), "/users/42");
/// ```
#[derive(Debug, Clone)]
pub enum Interpolator {
    Literal(String),
    Template(Plan),
}

impl Interpolator {
    pub fn compile(node: &Node) -> Self {
        let plan = Plan::build(node);
        let interpolator = if plan.has_captures() {
            Interpolator::Template(plan)
        } else {
            Interpolator::Literal(render(&plan, &ParamMap::new()))
        };
        debug!(
            pattern = %node,
            constant = interpolator.is_literal(),
            "compiled interpolator"
        );
        interpolator
    }

    /// Renders the pattern
    ///
    /// # Panics
    ///
    /// Panics when a required parameter is absent or empty.
    pub fn interpolate(&self, params: &ParamMap) -> String {
        match self {
            Interpolator::Literal(text) => text.clone(),
            Interpolator::Template(plan) => render(plan, params),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Interpolator::Literal(_))
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Interpolator::Literal(text) => Some(text.as_str()),
            Interpolator::Template(_) => None,
        }
    }
}

fn render(plan: &Plan, params: &ParamMap) -> String {
    let segments: Vec<String> = plan
        .groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|step| render_step(step, params, encode_component))
                .collect::<String>()
        })
        .filter(|segment| !segment.is_empty())
        .collect();

    let mut out = format!("/{}", segments.join("/"));
    if let Some(entries) = &plan.query {
        let query = render_query(entries, params);
        if !query.is_empty() {
            out.push('?');
            out.push_str(&query);
        }
    }
    out
}

/// Escaping applied to captured values; pattern text is emitted as written
type Escape = fn(&str) -> Cow<'_, str>;

fn verbatim(raw: &str) -> Cow<'_, str> {
    Cow::Borrowed(raw)
}

fn render_step(step: &Step, params: &ParamMap, escape: Escape) -> String {
    match step {
        Step::Literal(text) => text.clone(),
        Step::Capture(capture) => match params.get_key(&capture.key) {
            Some(ParamValue::Single(value)) if !value.is_empty() => escape(value).into_owned(),
            Some(ParamValue::Multiple(values)) if !values.is_empty() => values
                .iter()
                .map(|value| escape(value.as_str()))
                .collect::<Vec<_>>()
                .join("/"),
            _ if capture.optional => String::new(),
            _ => panic!("missing value for required parameter `{}`", capture.key),
        },
        Step::Prefix(text, inner) => match render_step(inner, params, escape) {
            rendered if rendered.is_empty() => rendered,
            rendered => format!("{text}{rendered}"),
        },
        Step::Optional(inner) if provides_values(inner, params) => render_step(inner, params, escape),
        Step::Optional(_) => String::new(),
        Step::Repeat { inner, .. } => render_step(inner, params, escape),
        Step::Sequence(steps) => steps.iter().map(|step| render_step(step, params, escape)).collect(),
    }
}

/// A step without captures always renders; otherwise at least one capture must be set
fn provides_values(step: &Step, params: &ParamMap) -> bool {
    let mut captures = Vec::new();
    step.collect_captures(&mut captures);
    captures.is_empty()
        || captures
            .iter()
            .any(|capture| params.get_key(&capture.key).is_some_and(|value| !value.is_empty()))
}

fn render_query(entries: &[QueryStep], params: &ParamMap) -> String {
    entries
        .iter()
        .flat_map(|entry| match &entry.step {
            // A bare `key` entry renders as the key alone
            Step::Literal(text) if text.is_empty() => vec![encode_component(&entry.key).into_owned()],
            step => query_values(step, params)
                .into_iter()
                .filter(|value| !value.is_empty())
                .map(|value| format!("{}={}", encode_component(&entry.key), encode_component(&value)))
                .collect(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Values rendered for one query key; lists become repeated `key=value` pairs
fn query_values(step: &Step, params: &ParamMap) -> Vec<String> {
    match step {
        Step::Capture(capture) if capture.multiple => match params.get_key(&capture.key) {
            Some(ParamValue::Multiple(values)) if !values.is_empty() => values.clone(),
            Some(ParamValue::Single(value)) if !value.is_empty() => vec![value.clone()],
            _ if capture.optional => Vec::new(),
            _ => panic!("missing value for required parameter `{}`", capture.key),
        },
        Step::Prefix(text, inner) => query_values(inner, params)
            .into_iter()
            .filter(|value| !value.is_empty())
            .map(|value| format!("{text}{value}"))
            .collect(),
        other => vec![render_step(other, params, verbatim)],
    }
}
