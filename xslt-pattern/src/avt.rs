//! AttributeValueTemplate (§4.5): `{...}`-delimited XPath expressions
//! embedded in otherwise-literal attribute text.

use xslt_name::Namespaces;

use crate::error::{ParserError, Span};
use crate::xpath::{AvtEvaluator, ExpressionCache, XPathCompiler};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart<E> {
    Literal(String),
    Expr(E),
}

/// A parsed attribute value template. Immutable once built; `evaluate`
/// never re-parses the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValueTemplate<E> {
    parts: Vec<TemplatePart<E>>,
    source: String,
}

impl<E: Clone> AttributeValueTemplate<E> {
    /// Parses `source` and compiles every embedded expression through
    /// `cache` (§4.5: "each expression part is compiled with the
    /// enclosing namespace resolver and the result is cached").
    pub fn parse<C>(
        source: &str,
        namespaces: &Namespaces,
        cache: &ExpressionCache<C>,
    ) -> Result<Self, ParserError>
    where
        C: XPathCompiler<Expr = E>,
        C::Error: std::fmt::Display,
    {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let bytes: Vec<char> = source.chars().collect();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                '{' if bytes.get(i + 1) == Some(&'{') => {
                    literal.push('{');
                    i += 2;
                }
                '}' if bytes.get(i + 1) == Some(&'}') => {
                    literal.push('}');
                    i += 2;
                }
                '{' => {
                    if !literal.is_empty() {
                        parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                    }
                    let start = i;
                    i += 1;
                    let expr_start = i;
                    let mut depth = 1usize;
                    while i < bytes.len() && depth > 0 {
                        match bytes[i] {
                            '\'' | '"' => {
                                let quote = bytes[i];
                                i += 1;
                                while i < bytes.len() && bytes[i] != quote {
                                    i += 1;
                                }
                                i += 1;
                            }
                            '{' => {
                                depth += 1;
                                i += 1;
                            }
                            '}' => {
                                depth -= 1;
                                i += 1;
                            }
                            _ => i += 1,
                        }
                    }
                    if depth != 0 {
                        return Err(ParserError::UnmatchedBrace {
                            source_text: source.to_string(),
                            span: Span::new(start, bytes.len()),
                        });
                    }
                    let expr_source: String = bytes[expr_start..i - 1].iter().collect();
                    let expr = cache.compile(&expr_source, namespaces).map_err(|err| {
                        ParserError::Expression {
                            message: err.to_string(),
                            span: Span::new(expr_start, i - 1),
                        }
                    })?;
                    parts.push(TemplatePart::Expr(expr));
                }
                '}' => {
                    return Err(ParserError::UnmatchedBrace {
                        source_text: source.to_string(),
                        span: Span::new(i, i + 1),
                    });
                }
                c => {
                    literal.push(c);
                    i += 1;
                }
            }
        }
        if !literal.is_empty() || parts.is_empty() {
            parts.push(TemplatePart::Literal(literal));
        }
        Ok(Self {
            parts,
            source: source.to_string(),
        })
    }

    /// A static AVT has exactly one literal part and nothing else, so
    /// `evaluate` can skip expression dispatch entirely.
    pub fn is_static(&self) -> bool {
        matches!(self.parts.as_slice(), [TemplatePart::Literal(_)])
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn parts(&self) -> &[TemplatePart<E>] {
        &self.parts
    }

    /// Concatenates each part's string value (§4.5).
    pub fn evaluate<C>(&self, ctx: &C) -> String
    where
        C: AvtEvaluator<Expr = E>,
    {
        if let [TemplatePart::Literal(only)] = self.parts.as_slice() {
            return only.clone();
        }
        let mut out = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Literal(s) => out.push_str(s),
                TemplatePart::Expr(e) => out.push_str(&ctx.evaluate_to_string(e)),
            }
        }
        out
    }
}
