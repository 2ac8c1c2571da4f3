//! Expanded names, Clark notation, and namespace bindings shared across the
//! XSLT compiled-IR core.

mod expanded_name;
mod namespaces;

pub use expanded_name::{ExpandedName, NamePart};
pub use namespaces::{NamespaceLookup, Namespaces};

/// The `http://www.w3.org/1999/XSL/Transform` namespace URI.
pub const XSLT_NAMESPACE: &str = "http://www.w3.org/1999/XSL/Transform";
/// The XML Schema namespace URI, used by schema-type constraints (§4.1.1).
pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
/// The `xml:` namespace, always bound.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
