//! The Pattern algebra (§4.3): the compiled form every match-pattern
//! string is parsed into, and the thing a runtime asks `matches` of.

use crate::error::DynamicError;
use crate::node::Node;
use crate::node_test::NodeTest;
use crate::priority::default_priority;
use crate::step::{Axis, PatternStep};
use crate::xpath::{AvtEvaluator, MatchContext, PredicateContext};

/// A single id/key/doc/variable argument: either a literal string, a
/// variable reference, or an arbitrary compiled expression (§4.4 step 6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument<E> {
    Literal(String),
    VarRef(String),
    Expr(E),
}

/// `id(...)` / `element-with-id(...)` root: one or more id-value sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRoot<E> {
    pub ids: Vec<Argument<E>>,
}

/// `key(...)` root: a key name plus the value to look it up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRoot<E> {
    pub key_name: String,
    pub value: Argument<E>,
}

/// A pattern rooted at something other than the document root: `id(...)`,
/// `element-with-id(...)`, `key(...)`, `doc(...)`, or `$var`, optionally
/// followed by a trailing path (§4.3's "trailing-axis variants walk
/// ancestors").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rooted<E, R> {
    pub root: R,
    pub trailing: Vec<PatternStep<E>>,
}

/// A single parsed path step together with the leaf node-test it ends
/// in; used by [`PatternVariant::Path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern<E> {
    pub steps: Vec<PatternStep<E>>,
    pub absolute: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternVariant<E> {
    Root,
    DocumentNode,
    NameTest {
        node_test: NodeTest,
        predicates: Vec<E>,
    },
    Path(PathPattern<E>),
    Union(Vec<Pattern<E>>),
    Intersect(Box<Pattern<E>>, Box<Pattern<E>>),
    Except(Box<Pattern<E>>, Box<Pattern<E>>),
    /// `.[ predicate ]`: never matches a node, only an atomic value.
    Atomic { predicate: E },
    Id(Rooted<E, IdRoot<E>>),
    ElementWithId(Rooted<E, IdRoot<E>>),
    Key(Rooted<E, KeyRoot<E>>),
    Doc(Rooted<E, E>),
    Variable(Rooted<E, String>),
}

/// A compiled match pattern (§4.3). Carries its source text and
/// precomputed default priority alongside the variant, since both are
/// invariant data every variant needs regardless of shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern<E> {
    pub variant: PatternVariant<E>,
    pub source: String,
    pub default_priority: f64,
}

impl<E: Clone> Pattern<E> {
    pub fn new(variant: PatternVariant<E>, source: impl Into<String>) -> Self {
        let default_priority = default_priority(&variant);
        Self {
            variant,
            source: source.into(),
            default_priority,
        }
    }

    pub fn can_match_atomic_values(&self) -> bool {
        matches!(self.variant, PatternVariant::Atomic { .. })
    }

    /// §4.3's `matches`. Returns `Err` only for a propagated `XTDE0640`;
    /// every other predicate fault is already folded into `Ok(false)`.
    pub fn matches<N, C>(&self, node: &N, ctx: &C) -> Result<bool, DynamicError>
    where
        N: Node,
        C: MatchContext<N, Expr = E> + AvtEvaluator<Expr = E>,
    {
        match &self.variant {
            PatternVariant::Root => Ok(node.parent().is_none()),
            PatternVariant::DocumentNode => {
                Ok(node.kind() == crate::node::NodeKind::Root)
            }
            PatternVariant::NameTest {
                node_test,
                predicates,
            } => {
                if !node_test.matches(node) {
                    return Ok(false);
                }
                let (position, size) = sibling_position(node, node_test, Axis::Child);
                predicate_holds(predicates, node, position, size, ctx)
            }
            PatternVariant::Path(path) => matches_path(path, node, ctx),
            PatternVariant::Union(alts) => {
                for alt in alts {
                    if alt.matches(node, ctx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            PatternVariant::Intersect(left, right) => {
                Ok(left.matches(node, ctx)? && right.matches(node, ctx)?)
            }
            PatternVariant::Except(left, right) => {
                Ok(left.matches(node, ctx)? && !right.matches(node, ctx)?)
            }
            PatternVariant::Atomic { .. } => Ok(false),
            PatternVariant::Id(rooted) => {
                matches_id_like(rooted, node, ctx, |n, ctx| is_id_match(&rooted.root, n, ctx))
            }
            PatternVariant::ElementWithId(rooted) => {
                matches_id_like(rooted, node, ctx, |n, ctx| {
                    is_element_with_id_match(&rooted.root, n, ctx)
                })
            }
            PatternVariant::Key(rooted) => matches_id_like(rooted, node, ctx, |n, ctx| {
                is_key_match(&rooted.root, n, ctx)
            }),
            PatternVariant::Doc(rooted) => matches_id_like(rooted, node, ctx, |n, ctx| {
                ctx.doc_nodes(&rooted.root).iter().any(|d| d.is_same_node(n))
            }),
            PatternVariant::Variable(rooted) => matches_id_like(rooted, node, ctx, |n, ctx| {
                ctx.variable_nodes(&rooted.root)
                    .iter()
                    .any(|v| v.is_same_node(n))
            }),
        }
    }

    /// §4.3's `matchesAtomicValue`, `false` for every variant but
    /// [`PatternVariant::Atomic`].
    pub fn matches_atomic_value<N, C>(&self, value: &str, ctx: &C) -> Result<bool, DynamicError>
    where
        N: Node,
        C: MatchContext<N, Expr = E>,
    {
        match &self.variant {
            PatternVariant::Atomic { predicate } => {
                match ctx.evaluate_atomic_predicate(predicate, value) {
                    Ok(holds) => Ok(holds),
                    Err(err) if err.is_xtde0640() => Err(err),
                    Err(_) => Ok(false),
                }
            }
            _ => Ok(false),
        }
    }
}

fn matches_path<N, C>(path: &PathPattern<C::Expr>, node: &N, ctx: &C) -> Result<bool, DynamicError>
where
    N: Node,
    C: MatchContext<N>,
{
    let Some((last, preceding)) = path.steps.split_last() else {
        return Ok(false);
    };
    if !last.node_test.matches(node) {
        return Ok(false);
    }
    let (position, size) = sibling_position(node, &last.node_test, last.axis);
    if !predicate_holds(&last.predicates, node, position, size, ctx)? {
        return Ok(false);
    }

    let mut current = node.clone();
    for step in preceding.iter().rev() {
        match walk_step_backward(step, &current, ctx)? {
            Some(next) => current = next,
            None => return Ok(false),
        }
    }

    if path.absolute {
        Ok(match current.parent() {
            Some(ancestor) => ancestor.parent().is_none(),
            None => true,
        })
    } else {
        Ok(true)
    }
}

/// One backward step of the §4.3 Path-matching algorithm, shared by
/// [`matches_path`] and the trailing-path walk of the rooted variants.
fn walk_step_backward<N, C>(
    step: &PatternStep<C::Expr>,
    current: &N,
    ctx: &C,
) -> Result<Option<N>, DynamicError>
where
    N: Node,
    C: MatchContext<N>,
{
    match step.axis {
        Axis::Child | Axis::Attribute => match current.parent() {
            None => Ok(None),
            Some(parent) => {
                if !step.node_test.matches(&parent) {
                    return Ok(None);
                }
                let (position, size) = sibling_position(&parent, &step.node_test, step.axis);
                if predicate_holds(&step.predicates, &parent, position, size, ctx)? {
                    Ok(Some(parent))
                } else {
                    Ok(None)
                }
            }
        },
        Axis::DescendantOrSelf | Axis::Descendant => {
            let mut ancestor = current.parent();
            while let Some(candidate) = ancestor {
                if step.node_test.matches(&candidate) {
                    let (position, size) =
                        sibling_position(&candidate, &step.node_test, Axis::Child);
                    if predicate_holds(&step.predicates, &candidate, position, size, ctx)? {
                        return Ok(Some(candidate));
                    }
                }
                ancestor = candidate.parent();
            }
            Ok(None)
        }
        Axis::Self_ => {
            if !step.node_test.matches(current) {
                return Ok(None);
            }
            let (position, size) = sibling_position(current, &step.node_test, Axis::Child);
            if predicate_holds(&step.predicates, current, position, size, ctx)? {
                Ok(Some(current.clone()))
            } else {
                Ok(None)
            }
        }
    }
}

fn matches_id_like<N, C, R>(
    rooted: &Rooted<C::Expr, R>,
    node: &N,
    ctx: &C,
    is_root_member: impl Fn(&N, &C) -> bool,
) -> Result<bool, DynamicError>
where
    N: Node,
    C: MatchContext<N> + AvtEvaluator<Expr = <C as MatchContext<N>>::Expr>,
{
    if rooted.trailing.is_empty() {
        return Ok(is_root_member(node, ctx));
    }
    let Some((last, preceding)) = rooted.trailing.split_last() else {
        return Ok(is_root_member(node, ctx));
    };
    if !last.node_test.matches(node) {
        return Ok(false);
    }
    let (position, size) = sibling_position(node, &last.node_test, last.axis);
    if !predicate_holds(&last.predicates, node, position, size, ctx)? {
        return Ok(false);
    }
    let mut current = node.clone();
    for step in preceding.iter().rev() {
        match walk_step_backward(step, &current, ctx)? {
            Some(next) => current = next,
            None => return Ok(false),
        }
    }
    Ok(is_root_member(&current, ctx))
}

fn is_id_match<N, C>(root: &IdRoot<C::Expr>, node: &N, ctx: &C) -> bool
where
    N: Node,
    C: MatchContext<N> + AvtEvaluator<Expr = <C as MatchContext<N>>::Expr>,
{
    if node.kind() != crate::node::NodeKind::Element {
        return false;
    }
    let ids = resolve_arguments(&root.ids, ctx);
    let value = node
        .attribute_value(Some(xslt_name::XML_NAMESPACE), "id")
        .or_else(|| node.attribute_value(None, "id"));
    match value {
        Some(value) => ids.iter().any(|id| id == &value),
        None => false,
    }
}

fn is_element_with_id_match<N, C>(root: &IdRoot<C::Expr>, node: &N, ctx: &C) -> bool
where
    N: Node,
    C: MatchContext<N> + AvtEvaluator<Expr = <C as MatchContext<N>>::Expr>,
{
    let ids = resolve_arguments(&root.ids, ctx);
    node.children().iter().any(|child| {
        child.kind() == crate::node::NodeKind::Element
            && matches!(
                child.type_annotation(),
                Some(crate::node::TypeAnnotation::Builtin(xs)) if xs.derives_from(xslt_schema_type::Xs::ID)
            )
            && ids.iter().any(|id| id == &child.string_value())
    })
}

fn is_key_match<N, C>(root: &KeyRoot<C::Expr>, node: &N, ctx: &C) -> bool
where
    N: Node,
    C: MatchContext<N> + AvtEvaluator<Expr = <C as MatchContext<N>>::Expr>,
{
    let value = resolve_argument(&root.value, ctx);
    match ctx.key_nodes(&root.key_name, &value) {
        Some(nodes) => nodes.iter().any(|n| n.is_same_node(node)),
        None => false,
    }
}

fn resolve_arguments<N, C>(args: &[Argument<C::Expr>], ctx: &C) -> Vec<String>
where
    C: MatchContext<N> + AvtEvaluator<Expr = <C as MatchContext<N>>::Expr>,
{
    args.iter().map(|a| resolve_argument(a, ctx)).collect()
}

fn resolve_argument<N, C>(arg: &Argument<C::Expr>, ctx: &C) -> String
where
    C: MatchContext<N> + AvtEvaluator<Expr = <C as MatchContext<N>>::Expr>,
{
    match arg {
        Argument::Literal(s) => s.clone(),
        Argument::VarRef(name) => ctx.variable_string(name),
        Argument::Expr(e) => ctx.evaluate_to_string(e),
    }
}

/// The 1-based position and size of `node` among its parent's
/// axis-appropriate children that also satisfy `node_test` (§4.3.1).
fn sibling_position<N: Node>(node: &N, node_test: &NodeTest, axis: Axis) -> (usize, usize) {
    let Some(parent) = node.parent() else {
        return (1, 1);
    };
    let siblings = match axis {
        Axis::Attribute => parent.attributes(),
        _ => parent.children(),
    };
    let mut position = 0;
    let mut size = 0;
    for sibling in &siblings {
        if node_test.matches(sibling) {
            size += 1;
            if sibling.is_same_node(node) {
                position = size;
            }
        }
    }
    if position == 0 {
        (1, 1)
    } else {
        (position, size)
    }
}

fn predicate_holds<N, C>(
    predicates: &[C::Expr],
    node: &N,
    position: usize,
    size: usize,
    ctx: &C,
) -> Result<bool, DynamicError>
where
    N: Node,
    C: MatchContext<N>,
{
    for predicate in predicates {
        let context = PredicateContext {
            node,
            position,
            size,
        };
        match ctx.evaluate_predicate(predicate, context) {
            Ok(outcome) => {
                if !outcome.holds_at(position) {
                    return Ok(false);
                }
            }
            Err(err) if err.is_xtde0640() => return Err(err),
            Err(_) => return Ok(false),
        }
    }
    Ok(true)
}
