//! The boundary to the XPath parser/evaluator collaborator (§1 "explicitly
//! out of scope"; §4.3.1, §4.5, §5, §9). This crate never parses or
//! evaluates XPath itself — it only holds opaque compiled-expression
//! handles and calls back through these traits when a pattern or AVT
//! needs a value.

use std::sync::Mutex;

use ahash::HashMap;

use xslt_name::Namespaces;

use crate::error::DynamicError;

/// "Compile expression → opaque handle": the one thing this core asks of
/// the XPath parser (§1). `Expr` is never inspected by this crate, only
/// stored and handed back to [`PredicateEvaluator`]/evaluation callbacks.
pub trait XPathCompiler {
    type Expr: Clone;
    type Error;

    fn compile(&self, source: &str, namespaces: &Namespaces) -> Result<Self::Expr, Self::Error>;
}

/// A process-wide cache of compiled XPath expressions, keyed by source
/// text (§4.3.1, §4.5, §5). Safe to share across compilation threads;
/// duplicate compilation under a race is acceptable and preferred over
/// serializing compiles behind a held lock (§9).
pub struct ExpressionCache<C: XPathCompiler> {
    compiler: C,
    cache: Mutex<HashMap<String, C::Expr>>,
}

impl<C: XPathCompiler> ExpressionCache<C> {
    pub fn new(compiler: C) -> Self {
        Self {
            compiler,
            cache: Mutex::new(HashMap::default()),
        }
    }

    /// Returns a cached expression for `source` if one exists, otherwise
    /// compiles, caches, and returns it.
    pub fn compile(&self, source: &str, namespaces: &Namespaces) -> Result<C::Expr, C::Error> {
        if let Some(expr) = self.cache.lock().unwrap().get(source) {
            return Ok(expr.clone());
        }
        let expr = self.compiler.compile(source, namespaces)?;
        self.cache
            .lock()
            .unwrap()
            .entry(source.to_string())
            .or_insert_with(|| expr.clone());
        Ok(expr)
    }

    pub fn len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The derived evaluation context for a pattern predicate (§4.3.1): the
/// candidate node, its one-based position among matching siblings, and
/// the count of matching siblings.
pub struct PredicateContext<'a, N> {
    pub node: &'a N,
    pub position: usize,
    pub size: usize,
}

/// The coerced result of evaluating a predicate expression (§4.3.1).
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateOutcome {
    Boolean(bool),
    /// A numeric result is compared against the context position with a
    /// `1e-4` tolerance rather than coerced to boolean.
    Number(f64),
}

const POSITION_TOLERANCE: f64 = 1e-4;

impl PredicateOutcome {
    /// Is this predicate outcome satisfied at the given one-based
    /// position (§4.3.1)?
    pub fn holds_at(&self, position: usize) -> bool {
        match self {
            PredicateOutcome::Boolean(b) => *b,
            PredicateOutcome::Number(n) => (*n - position as f64).abs() < POSITION_TOLERANCE,
        }
    }
}

/// Everything a [`crate::pattern::Pattern`] needs from its environment in
/// order to answer `matches` (§4.3, §4.3.1): predicate evaluation, and
/// resolution for the `doc()`/`id()`/`key()`/`$var` pattern variants.
///
/// A runtime implements this once, backed by its real XPath evaluator and
/// document set; this crate only calls through it.
pub trait MatchContext<N> {
    type Expr: Clone;

    /// Evaluate a predicate expression in the derived context of
    /// §4.3.1. Errors whose code is `XTDE0640` must be returned as-is;
    /// the caller (this crate) re-raises them. All other errors should
    /// still be returned here — [`crate::pattern::Pattern::matches`]
    /// swallows everything but `XTDE0640` itself, so implementors need
    /// not special-case swallowing.
    fn evaluate_predicate(
        &self,
        expr: &Self::Expr,
        context: PredicateContext<'_, N>,
    ) -> Result<PredicateOutcome, DynamicError>;

    /// Evaluate an [`crate::pattern::PatternVariant::Atomic`] predicate
    /// with the candidate atomic value as the context item, returning its
    /// boolean coercion (§4.3). Subject to the same `XTDE0640` rule as
    /// `evaluate_predicate`.
    fn evaluate_atomic_predicate(&self, expr: &Self::Expr, value: &str) -> Result<bool, DynamicError>;

    /// Resolve a `key()` pattern's key name and value to the set of
    /// matching nodes. `None` means the key is not declared, which per
    /// §4.3 means the pattern never matches (not an error).
    fn key_nodes(&self, key_name: &str, value: &str) -> Option<Vec<N>>;

    /// Resolve a `doc()`/`document()` call's argument expression to the
    /// document node(s) it names.
    fn doc_nodes(&self, expr: &Self::Expr) -> Vec<N>;

    /// Resolve a `$name` variable reference used as a pattern root to the
    /// node(s) currently bound to it.
    fn variable_nodes(&self, name: &str) -> Vec<N>;

    /// The string value of a variable used as an `id()`/`key()` argument
    /// (§4.4 step 5, §4.3 Id/Key variants).
    fn variable_string(&self, name: &str) -> String;
}

/// Stringifies a compiled expression in the current dynamic context
/// (§4.5 `evaluate(context)`; also used to resolve an `id()`/`key()`
/// argument that is itself an expression rather than a literal or
/// variable reference). Evaluates in whatever dynamic context the
/// runtime is currently processing; a value-null contributes the empty
/// string, never an error.
pub trait AvtEvaluator {
    type Expr: Clone;

    fn evaluate_to_string(&self, expr: &Self::Expr) -> String;
}
