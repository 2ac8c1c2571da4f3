use xslt_schema_type::Xs;

/// The kind of a node in the abstract source-tree model this core matches
/// against (§3: "Node (external)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

/// The schema-type annotation carried by a node, if any (§3, §4.1.1).
///
/// `None` (absent, i.e. `Node::type_annotation` returning `None`) means
/// the node has no type annotation at all — the case the `untyped` /
/// `untypedAtomic` constraint checks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeAnnotation {
    /// A built-in XSD simple type, enabling the `derives_from` check.
    Builtin(Xs),
    /// A named type outside the built-in hierarchy; §4.1.1 falls back to
    /// exact local-name comparison for these.
    Named { uri: String, local: String },
}

/// The abstract node interface the compiled IR matches patterns against.
///
/// This is supplied by the runtime (§3); the compiled-IR core never
/// constructs or owns nodes, it only asks questions of them. A real
/// runtime's tree representation implements this trait directly rather
/// than copying into an intermediate structure.
pub trait Node: Clone {
    fn kind(&self) -> NodeKind;

    /// `(namespace-uri, local-name)`, or `None` for node kinds that have
    /// no name (text, comment, root, unnamed PI-less cases never occur
    /// here since PI nodes always have a target).
    fn name(&self) -> Option<(Option<&str>, &str)>;

    fn string_value(&self) -> String;

    /// A total order over nodes in the same tree, used to compute
    /// sibling position for predicates (§4.3.1).
    fn document_order(&self) -> u64;

    fn parent(&self) -> Option<Self>;

    fn children(&self) -> Vec<Self>
    where
        Self: Sized;

    fn attributes(&self) -> Vec<Self>
    where
        Self: Sized;

    /// The value of an attribute with the given expanded name, as plain
    /// text — used by the `Id`/`ElementWithId` pattern variants (§4.3) to
    /// read `xml:id`/`id` without a full attribute-node round trip.
    fn attribute_value(&self, uri: Option<&str>, local: &str) -> Option<String>;

    fn type_annotation(&self) -> Option<TypeAnnotation>;

    /// Identity comparison: are these two handles the same node? Plain
    /// `PartialEq` is deliberately not required of implementors, since
    /// many tree representations hand out fresh handles per traversal.
    fn is_same_node(&self, other: &Self) -> bool;
}

/// Child-axis "any node" test (§4.1): true for element, text, comment and
/// processing-instruction kinds; false for root and attribute.
pub fn is_any_child_node(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Element | NodeKind::Text | NodeKind::Comment | NodeKind::ProcessingInstruction
    )
}
