use std::fmt;

/// One half of an [`ExpandedName`]: either a literal string or the `*`
/// wildcard used by name tests (§4.1) and Clark-notation wildcards (§3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamePart {
    /// `*` — matches any value for this half of the name.
    Wildcard,
    /// A concrete string. An empty URI literal means "no namespace".
    Literal(String),
}

impl NamePart {
    fn matches(&self, value: &str) -> bool {
        match self {
            NamePart::Wildcard => true,
            NamePart::Literal(s) => s == value,
        }
    }
}

/// A namespace-uri / local-name pair (§3).
///
/// Two conventions distinguish "no namespace" from "any namespace": an
/// empty URI literal (`NamePart::Literal(String::new())`) means the name
/// has no namespace, while [`NamePart::Wildcard`] in the URI slot means
/// "any namespace at all". The same wildcard convention applies
/// independently to the local-name slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpandedName {
    uri: NamePart,
    local: NamePart,
}

impl ExpandedName {
    /// A concrete name: no wildcards. The common case for declaration
    /// keys (functions, variables, keys, modes).
    pub fn new(uri: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            uri: NamePart::Literal(uri.into()),
            local: NamePart::Literal(local.into()),
        }
    }

    /// A name with no namespace at all.
    pub fn unqualified(local: impl Into<String>) -> Self {
        Self::new(String::new(), local)
    }

    /// `{uri}*` — matches any local name in a fixed namespace.
    pub fn any_local(uri: impl Into<String>) -> Self {
        Self {
            uri: NamePart::Literal(uri.into()),
            local: NamePart::Wildcard,
        }
    }

    /// `*:local` — matches a fixed local name in any namespace.
    pub fn any_uri(local: impl Into<String>) -> Self {
        Self {
            uri: NamePart::Wildcard,
            local: NamePart::Literal(local.into()),
        }
    }

    /// `*` — matches any name whatsoever.
    pub fn any() -> Self {
        Self {
            uri: NamePart::Wildcard,
            local: NamePart::Wildcard,
        }
    }

    pub fn uri(&self) -> &NamePart {
        &self.uri
    }

    pub fn local(&self) -> &NamePart {
        &self.local
    }

    /// `true` iff neither half of this name is a wildcard.
    pub fn is_concrete(&self) -> bool {
        matches!(self.uri, NamePart::Literal(_)) && matches!(self.local, NamePart::Literal(_))
    }

    /// Does the concrete pair `(uri, local)` satisfy this (possibly
    /// wildcarded) name? An absent URI on the candidate is treated as the
    /// empty string, per §4.1.
    pub fn matches(&self, uri: Option<&str>, local: &str) -> bool {
        let uri = uri.unwrap_or("");
        self.uri.matches(uri) && self.local.matches(local)
    }

    /// Clark notation: `{uri}local`, with `{uri}*` / `*` for wildcards.
    pub fn to_clark(&self) -> String {
        match (&self.uri, &self.local) {
            (NamePart::Wildcard, NamePart::Wildcard) => "*".to_string(),
            (NamePart::Wildcard, NamePart::Literal(local)) => format!("*:{local}"),
            (NamePart::Literal(uri), NamePart::Wildcard) => format!("{{{uri}}}*"),
            (NamePart::Literal(uri), NamePart::Literal(local)) => format!("{{{uri}}}{local}"),
        }
    }
}

impl fmt::Display for ExpandedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_clark())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clark_notation_concrete() {
        let name = ExpandedName::new("http://example.com/ns", "foo");
        assert_eq!(name.to_clark(), "{http://example.com/ns}foo");
    }

    #[test]
    fn clark_notation_unqualified() {
        let name = ExpandedName::unqualified("foo");
        assert_eq!(name.to_clark(), "{}foo");
    }

    #[test]
    fn clark_notation_wildcards() {
        assert_eq!(ExpandedName::any().to_clark(), "*");
        assert_eq!(ExpandedName::any_local("urn:x").to_clark(), "{urn:x}*");
        assert_eq!(ExpandedName::any_uri("foo").to_clark(), "*:foo");
    }

    #[test]
    fn matches_treats_absent_uri_as_empty() {
        let name = ExpandedName::unqualified("foo");
        assert!(name.matches(None, "foo"));
        assert!(name.matches(Some(""), "foo"));
        assert!(!name.matches(Some("urn:x"), "foo"));
    }

    #[test]
    fn wildcard_matching() {
        assert!(ExpandedName::any().matches(Some("urn:x"), "foo"));
        assert!(ExpandedName::any_local("urn:x").matches(Some("urn:x"), "anything"));
        assert!(!ExpandedName::any_local("urn:x").matches(Some("urn:y"), "anything"));
    }
}
