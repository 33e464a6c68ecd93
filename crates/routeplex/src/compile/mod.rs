//! Group decomposition shared by the matcher and the interpolator
//!
//! A [`Plan`] is the flat form of a [`Node`] tree: path groups (one per path
//! segment) followed by at most one query group. Separators come from the `/`
//! characters inside literal text; everything glued between two separators
//! lands in the same group, which makes it a compound group when it holds more
//! than one step.
//!
//! Unnamed captures are numbered by a counter local to one [`Plan::build`], so
//! the matcher and the interpolator each number them the same way.

pub mod interpolate;
pub mod matcher;

use crate::ast::{Node, QueryParam};
use crate::params::ParamKey;
use crate::schema::Schema;

pub use interpolate::Interpolator;
pub use matcher::Matcher;

// ============================================================================
// Core Types
// ============================================================================

/// A capture site: where a value is read from or written to
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub key: ParamKey,
    /// Absent values are accepted
    pub optional: bool,
    /// Captured as a list
    pub multiple: bool,
    pub schema: Option<Schema>,
}

/// One compiled matching/rendering unit
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Exact text, without separators
    Literal(String),
    Capture(Capture),
    /// Text glued in front of the inner step
    Prefix(String, Box<Step>),
    /// Zero or one occurrence of a non-capture step
    Optional(Box<Step>),
    /// Repeated non-capture step with a minimum count
    Repeat { inner: Box<Step>, min: usize },
    /// Steps that share one segment (or one query value)
    Sequence(Vec<Step>),
}

/// Steps matched against a single path segment
pub type Group = Vec<Step>;

/// One declared query key
#[derive(Debug, Clone, PartialEq)]
pub struct QueryStep {
    pub key: String,
    pub step: Step,
}

/// Flattened form of a pattern
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Plan {
    pub groups: Vec<Group>,
    pub query: Option<Vec<QueryStep>>,
}

// ============================================================================
// Step Helpers
// ============================================================================

impl Step {
    /// Text the step must start with inside a compound group, if fixed
    pub fn anchor(&self) -> Option<&str> {
        match self {
            Step::Literal(text) | Step::Prefix(text, _) if !text.is_empty() => Some(text.as_str()),
            Step::Sequence(steps) => steps.first().and_then(Step::anchor),
            _ => None,
        }
    }

    /// Whether the step accepts an absent value
    pub fn is_optional(&self) -> bool {
        match self {
            Step::Literal(_) => false,
            Step::Capture(capture) => capture.optional,
            Step::Prefix(_, inner) => inner.is_optional(),
            Step::Optional(_) => true,
            Step::Repeat { min, .. } => *min == 0,
            Step::Sequence(steps) => steps.iter().all(Step::is_optional),
        }
    }

    /// Whether the step may consume more than one segment
    pub fn is_repetition(&self) -> bool {
        match self {
            Step::Capture(capture) => capture.multiple,
            Step::Prefix(_, inner) | Step::Optional(inner) => inner.is_repetition(),
            Step::Repeat { .. } => true,
            Step::Literal(_) | Step::Sequence(_) => false,
        }
    }

    fn optional(self) -> Step {
        match self {
            Step::Capture(capture) => Step::Capture(Capture {
                optional: true,
                ..capture
            }),
            Step::Prefix(text, inner) => Step::Prefix(text, Box::new(inner.optional())),
            other => Step::Optional(Box::new(other)),
        }
    }

    fn repeated(self, min: usize) -> Step {
        match self {
            Step::Capture(capture) => Step::Capture(Capture {
                multiple: true,
                optional: capture.optional || min == 0,
                ..capture
            }),
            Step::Prefix(text, inner) => Step::Prefix(text, Box::new(inner.repeated(min))),
            other => Step::Repeat {
                inner: Box::new(other),
                min,
            },
        }
    }

    fn collect_captures<'a>(&'a self, out: &mut Vec<&'a Capture>) {
        match self {
            Step::Literal(_) => {}
            Step::Capture(capture) => out.push(capture),
            Step::Prefix(_, inner) | Step::Optional(inner) | Step::Repeat { inner, .. } => {
                inner.collect_captures(out)
            }
            Step::Sequence(steps) => steps.iter().for_each(|step| step.collect_captures(out)),
        }
    }
}

// ============================================================================
// Plan Construction
// ============================================================================

impl Plan {
    /// Decomposes a pattern into groups
    ///
    /// # Examples
    ///
    /// ```
    /// use routeplex::compile::{Plan, Step};
    /// use routeplex::parse;
    ///
    /// let plan = Plan::build(&parse("/users/v:version"));
    /// assert_eq!(plan.groups.len(), 2);
    /// assert_eq!(plan.groups[0], vec![Step::Literal("users".to_string())]);
    /// assert_eq!(plan.groups[1].len(), 2);
    /// assert!(plan.query.is_none());
    /// ```
    pub fn build(node: &Node) -> Plan {
        let mut builder = PlanBuilder::default();
        builder.visit(node, None);
        builder.finish()
    }

    /// Every capture in traversal order, path first
    pub fn captures(&self) -> Vec<&Capture> {
        let mut out = Vec::new();
        self.groups
            .iter()
            .flatten()
            .for_each(|step| step.collect_captures(&mut out));
        if let Some(query) = &self.query {
            query
                .iter()
                .for_each(|entry| entry.step.collect_captures(&mut out));
        }
        out
    }

    pub fn has_captures(&self) -> bool {
        !self.captures().is_empty()
    }

    /// A repetition that is followed by another path group
    ///
    /// Greedy repetition never gives segments back, so such a group leaves
    /// nothing for the groups after it.
    pub fn has_non_terminal_repetition(&self) -> bool {
        let Some((_, leading)) = self.groups.split_last() else {
            return false;
        };
        leading.iter().flatten().any(Step::is_repetition)
    }
}

#[derive(Default)]
struct PlanBuilder {
    unnamed: usize,
    groups: Vec<Group>,
    current: Group,
    query: Option<Vec<QueryStep>>,
}

impl PlanBuilder {
    fn visit(&mut self, node: &Node, schema: Option<&Schema>) {
        match node {
            Node::Literal(text) => {
                for (index, piece) in text.split('/').enumerate() {
                    if index > 0 {
                        self.flush();
                    }
                    if !piece.is_empty() {
                        self.current.push(Step::Literal(piece.to_string()));
                    }
                }
            }
            Node::Concat(left, right) => {
                self.visit(left, schema);
                self.visit(right, schema);
            }
            Node::QueryParams(previous, params) => {
                self.visit(previous, schema);
                self.flush();
                let steps = self.query_steps(params, schema);
                self.query = Some(match self.query.take() {
                    Some(existing) => merge_query(existing, steps),
                    None => steps,
                });
            }
            Node::WithSchema(inner, attached) => self.visit(inner, Some(attached)),
            _ => {
                let step = self.step(node, schema);
                self.current.push(step);
            }
        }
    }

    fn query_steps(&mut self, params: &[QueryParam], schema: Option<&Schema>) -> Vec<QueryStep> {
        params
            .iter()
            .map(|param| QueryStep {
                key: param.key.clone(),
                step: self.step(&param.value, schema),
            })
            .collect()
    }

    /// Compiles a node that lives inside a single group
    fn step(&mut self, node: &Node, schema: Option<&Schema>) -> Step {
        match node {
            Node::Literal(text) => Step::Literal(text.clone()),
            Node::Param(name) => Self::capture(ParamKey::Named(name.clone()), schema),
            Node::UnnamedParam => {
                let key = ParamKey::Index(self.unnamed);
                self.unnamed += 1;
                Self::capture(key, schema)
            }
            Node::Optional(inner) => self.step(inner, schema).optional(),
            Node::ZeroOrMore(inner) => self.step(inner, schema).repeated(0),
            Node::OneOrMore(inner) => self.step(inner, schema).repeated(1),
            Node::Prefix(text, inner) => Step::Prefix(text.clone(), Box::new(self.step(inner, schema))),
            Node::Concat(..) => {
                let mut steps = Vec::new();
                self.flatten_into(node, schema, &mut steps);
                Step::Sequence(steps)
            }
            Node::WithSchema(inner, attached) => self.step(inner, Some(attached)),
            Node::QueryParams(..) => panic!("query block nested inside a capture: `{node}`"),
        }
    }

    fn flatten_into(&mut self, node: &Node, schema: Option<&Schema>, out: &mut Vec<Step>) {
        match node {
            Node::Concat(left, right) => {
                self.flatten_into(left, schema, out);
                self.flatten_into(right, schema, out);
            }
            other => out.push(self.step(other, schema)),
        }
    }

    fn capture(key: ParamKey, schema: Option<&Schema>) -> Step {
        Step::Capture(Capture {
            key,
            optional: false,
            multiple: false,
            schema: schema.cloned(),
        })
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.groups.push(std::mem::take(&mut self.current));
        }
    }

    fn finish(mut self) -> Plan {
        self.flush();
        Plan {
            groups: self.groups,
            query: self.query,
        }
    }
}

/// Right-hand entries replace left-hand entries with the same key
fn merge_query(left: Vec<QueryStep>, right: Vec<QueryStep>) -> Vec<QueryStep> {
    let mut merged: Vec<QueryStep> = left
        .into_iter()
        .filter(|entry| !right.iter().any(|r| r.key == entry.key))
        .collect();
    merged.extend(right);
    merged
}
