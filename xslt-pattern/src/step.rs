use crate::node_test::NodeTest;

/// The axis a [`PatternStep`] walks. Patterns only ever use these five
/// (§4.2); reverse axes like `parent::` or `preceding::` cannot appear in
/// a match pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Self_,
    Attribute,
}

/// One axis + node-test + optional predicate inside a path pattern
/// (§4.2). Predicates are stored as opaque compiled-expression handles of
/// type `E`, supplied by the XPath collaborator (§4.3.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternStep<E> {
    pub node_test: NodeTest,
    pub axis: Axis,
    pub predicates: Vec<E>,
}

impl<E> PatternStep<E> {
    pub fn new(axis: Axis, node_test: NodeTest) -> Self {
        Self {
            node_test,
            axis,
            predicates: Vec::new(),
        }
    }

    pub fn with_predicates(mut self, predicates: Vec<E>) -> Self {
        self.predicates = predicates;
        self
    }
}
