use ahash::HashMap;

use crate::XML_NAMESPACE;

/// Prefix → URI bindings captured from a stylesheet's lexical scope,
/// used to resolve `QName`s in patterns, AVTs, and attribute values
/// before they reach the pattern parser (§4.4: "namespace prefixes are
/// expected to have been pre-resolved").
#[derive(Debug, Clone)]
pub struct Namespaces {
    bindings: HashMap<String, String>,
    default_element_namespace: String,
}

impl Namespaces {
    pub fn new(bindings: HashMap<String, String>, default_element_namespace: String) -> Self {
        Self {
            bindings,
            default_element_namespace,
        }
    }

    /// An empty namespace context with only `xml:` bound, as XML requires.
    pub fn empty() -> Self {
        let mut bindings = HashMap::default();
        bindings.insert("xml".to_string(), XML_NAMESPACE.to_string());
        Self::new(bindings, String::new())
    }

    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        let uri = uri.into();
        if prefix.is_empty() {
            self.default_element_namespace = uri;
        } else {
            self.bindings.insert(prefix, uri);
        }
    }

    pub fn by_prefix(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }

    pub fn default_element_namespace(&self) -> &str {
        &self.default_element_namespace
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }
}

impl Default for Namespaces {
    fn default() -> Self {
        Self::empty()
    }
}

pub trait NamespaceLookup {
    fn by_prefix(&self, prefix: &str) -> Option<&str>;
}

impl NamespaceLookup for Namespaces {
    fn by_prefix(&self, prefix: &str) -> Option<&str> {
        Namespaces::by_prefix(self, prefix)
    }
}

impl<T: NamespaceLookup> NamespaceLookup for &T {
    fn by_prefix(&self, prefix: &str) -> Option<&str> {
        (**self).by_prefix(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_xml_prefix() {
        let namespaces = Namespaces::default();
        assert_eq!(namespaces.by_prefix("xml"), Some(XML_NAMESPACE));
        assert_eq!(namespaces.by_prefix("nope"), None);
    }

    #[test]
    fn empty_prefix_sets_default_element_namespace() {
        let mut namespaces = Namespaces::empty();
        namespaces.bind("", "urn:default");
        assert_eq!(namespaces.default_element_namespace(), "urn:default");
    }
}
