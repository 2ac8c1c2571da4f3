//! Match-pattern compiler, attribute value templates, and streamability
//! analysis for the XSLT compiled-IR core (§4.1 – §4.5, §4.11).
//!
//! This crate never parses XML or evaluates XPath itself; both are
//! injected collaborators reached through [`xpath::XPathCompiler`] and
//! [`xpath::MatchContext`].

mod avt;
mod error;
mod node;
mod parser;
mod pattern;
mod priority;
mod step;
mod streamability;
mod xpath;

#[cfg(test)]
mod test_support;

pub use avt::{AttributeValueTemplate, TemplatePart};
pub use error::{DynamicError, ParserError, Span};
pub use node::{Node, NodeKind, TypeAnnotation};
pub use node_test::{NodeTest, TypeConstraint};
pub use parser::PatternParser;
pub use pattern::{Argument, IdRoot, KeyRoot, PathPattern, Pattern, PatternVariant, Rooted};
pub use step::{Axis, PatternStep};
pub use streamability::{
    BufferingStrategy, Streamability, StreamabilityAnalyzer, StreamabilityResult,
};
pub use xpath::{
    AvtEvaluator, ExpressionCache, MatchContext, PredicateContext, PredicateOutcome, XPathCompiler,
};
