//! A minimal in-memory tree used only by this crate's own unit tests to
//! exercise [`crate::node::Node`] without depending on any particular
//! runtime's tree representation.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::node::{Node, NodeKind, TypeAnnotation};

struct NodeData {
    kind: NodeKind,
    uri: Option<String>,
    local: Option<String>,
    value: String,
    type_annotation: Option<TypeAnnotation>,
    doc_order: Cell<u64>,
    parent: RefCell<Weak<NodeData>>,
    children: RefCell<Vec<Rc<NodeData>>>,
    attributes: RefCell<Vec<Rc<NodeData>>>,
}

#[derive(Clone)]
pub(crate) struct TestNode(Rc<NodeData>);

impl TestNode {
    fn leaf(kind: NodeKind, uri: Option<&str>, local: Option<&str>, value: &str) -> Self {
        Self(Rc::new(NodeData {
            kind,
            uri: uri.map(str::to_string),
            local: local.map(str::to_string),
            value: value.to_string(),
            type_annotation: None,
            doc_order: Cell::new(0),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(vec![]),
            attributes: RefCell::new(vec![]),
        }))
    }

    pub(crate) fn root() -> Self {
        Self::leaf(NodeKind::Root, None, None, "")
    }

    pub(crate) fn element(local: &str) -> Self {
        Self::element_ns(None, local)
    }

    pub(crate) fn element_ns(uri: Option<&str>, local: &str) -> Self {
        Self::leaf(NodeKind::Element, uri, Some(local), "")
    }

    pub(crate) fn text(value: &str) -> Self {
        Self::leaf(NodeKind::Text, None, None, value)
    }

    pub(crate) fn comment() -> Self {
        Self::leaf(NodeKind::Comment, None, None, "")
    }

    pub(crate) fn pi(target: &str) -> Self {
        Self::leaf(NodeKind::ProcessingInstruction, None, Some(target), "")
    }

    pub(crate) fn attribute(local: &str) -> Self {
        Self::attribute_ns(None, local, "")
    }

    pub(crate) fn attribute_ns(uri: Option<&str>, local: &str, value: &str) -> Self {
        Self::leaf(NodeKind::Attribute, uri, Some(local), value)
    }

    pub(crate) fn with_type(mut self, annotation: TypeAnnotation) -> Self {
        Rc::get_mut(&mut self.0).unwrap().type_annotation = Some(annotation);
        self
    }

    pub(crate) fn with_children(self, children: Vec<TestNode>) -> Self {
        for child in &children {
            *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        }
        *self.0.children.borrow_mut() = children.into_iter().map(|c| c.0).collect();
        self
    }

    pub(crate) fn with_attributes(self, attributes: Vec<TestNode>) -> Self {
        for attribute in &attributes {
            *attribute.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        }
        *self.0.attributes.borrow_mut() = attributes.into_iter().map(|a| a.0).collect();
        self
    }

    /// Assigns document order depth-first and returns `self`, so trees
    /// built with `with_children` can be used for position-sensitive
    /// predicate tests.
    pub(crate) fn finish(self) -> Self {
        let mut counter = 0u64;
        self.assign_doc_order(&mut counter);
        self
    }

    fn assign_doc_order(&self, counter: &mut u64) {
        self.0.doc_order.set(*counter);
        *counter += 1;
        for child in self.0.children.borrow().iter() {
            TestNode(child.clone()).assign_doc_order(counter);
        }
    }
}

impl Node for TestNode {
    fn kind(&self) -> NodeKind {
        self.0.kind
    }

    fn name(&self) -> Option<(Option<&str>, &str)> {
        self.0.local.as_deref().map(|local| (self.0.uri.as_deref(), local))
    }

    fn string_value(&self) -> String {
        self.0.value.clone()
    }

    fn document_order(&self) -> u64 {
        self.0.doc_order.get()
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent.borrow().upgrade().map(TestNode)
    }

    fn children(&self) -> Vec<Self> {
        self.0.children.borrow().iter().cloned().map(TestNode).collect()
    }

    fn attributes(&self) -> Vec<Self> {
        self.0.attributes.borrow().iter().cloned().map(TestNode).collect()
    }

    fn attribute_value(&self, uri: Option<&str>, local: &str) -> Option<String> {
        self.0
            .attributes
            .borrow()
            .iter()
            .find(|a| a.local.as_deref() == Some(local) && a.uri.as_deref() == uri)
            .map(|a| a.value.clone())
    }

    fn type_annotation(&self) -> Option<TypeAnnotation> {
        self.0.type_annotation.clone()
    }

    fn is_same_node(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
