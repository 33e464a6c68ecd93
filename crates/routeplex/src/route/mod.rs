//! Pattern text handling
//!
//! - [`pattern`]: tokenizing a single segment or query value
//! - [`parser`]: building a [`Node`](crate::ast::Node) tree from a full pattern

pub mod parser;
pub mod pattern;

pub use parser::{parse, try_parse};
pub use pattern::PatternError;
