//! StreamabilityAnalyzer (§4.11): a coarse, diagnostic-only
//! classification of how much of a document a template or expression
//! needs to hold onto while it runs. Nothing here participates in
//! `matches` — a runtime uses it to decide whether it can stream a
//! stylesheet at all.

/// Ordered so that `max` implements the "monotonic combination" rule:
/// combining two classifications always yields the larger-ordinal one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Streamability {
    Motionless,
    Consuming,
    Grounded,
    FreeRanging,
}

impl Streamability {
    pub fn combine(self, other: Self) -> Self {
        self.max(other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferingStrategy {
    None,
    Grounded,
    FullDocument,
}

impl From<Streamability> for BufferingStrategy {
    fn from(s: Streamability) -> Self {
        match s {
            Streamability::Motionless | Streamability::Consuming => BufferingStrategy::None,
            Streamability::Grounded => BufferingStrategy::Grounded,
            Streamability::FreeRanging => BufferingStrategy::FullDocument,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamabilityResult {
    pub classification: Streamability,
    pub reasons: Vec<String>,
    pub buffering: BufferingStrategy,
}

const GROUNDED_MARKERS: &[&str] = &[
    "parent::",
    "ancestor::",
    "ancestor-or-self::",
    "preceding-sibling::",
    "..",
    "last()",
];

const FREE_RANGING_MARKERS: &[&str] = &["preceding::", "key(", "id(", "document("];

pub struct StreamabilityAnalyzer;

impl StreamabilityAnalyzer {
    /// The string-heuristic classification used "when the AST interface
    /// does not provide a classification" (§4.11) — in this crate, that
    /// is always, since XPath ASTs are out of scope.
    pub fn classify_text(source: &str) -> (Streamability, Vec<String>) {
        let grounded: Vec<String> = GROUNDED_MARKERS
            .iter()
            .filter(|m| source.contains(*m))
            .map(|m| m.to_string())
            .collect();
        if !grounded.is_empty() {
            return (Streamability::Grounded, grounded);
        }

        let mut free_ranging: Vec<String> = FREE_RANGING_MARKERS
            .iter()
            .filter(|m| source.contains(*m))
            .map(|m| m.to_string())
            .collect();
        if source.contains("//") && source.contains('[') {
            free_ranging.push("// combined with a predicate".to_string());
        }
        if !free_ranging.is_empty() {
            return (Streamability::FreeRanging, free_ranging);
        }

        (Streamability::Consuming, vec![])
    }

    /// Classifies one template rule: start from `motionless`, combine
    /// with the body's declared capability (supplied by the caller,
    /// since the body AST is out of scope here) and the match pattern's
    /// source text.
    pub fn classify_template(body: Streamability, pattern_source: Option<&str>) -> StreamabilityResult {
        let mut classification = Streamability::Motionless.combine(body);
        let mut reasons = Vec::new();
        if let Some(source) = pattern_source {
            let (pattern_class, pattern_reasons) = Self::classify_text(source);
            classification = classification.combine(pattern_class);
            reasons.extend(pattern_reasons.into_iter().map(|r| format!("pattern `{source}`: {r}")));
        }
        StreamabilityResult {
            buffering: BufferingStrategy::from(classification),
            classification,
            reasons,
        }
    }

    /// The stylesheet-level output: the max over all templates, plus the
    /// union of their reasons.
    pub fn classify_stylesheet<'a>(
        templates: impl IntoIterator<Item = &'a StreamabilityResult>,
    ) -> StreamabilityResult {
        let mut classification = Streamability::Motionless;
        let mut reasons = Vec::new();
        for template in templates {
            classification = classification.combine(template.classification);
            reasons.extend(template.reasons.iter().cloned());
        }
        StreamabilityResult {
            buffering: BufferingStrategy::from(classification),
            classification,
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_is_monotonic() {
        assert_eq!(
            Streamability::Consuming.combine(Streamability::Grounded),
            Streamability::Grounded
        );
        assert_eq!(
            Streamability::FreeRanging.combine(Streamability::Motionless),
            Streamability::FreeRanging
        );
    }

    #[test]
    fn parent_axis_is_grounded() {
        let (class, reasons) = StreamabilityAnalyzer::classify_text("parent::foo");
        assert_eq!(class, Streamability::Grounded);
        assert!(!reasons.is_empty());
    }

    #[test]
    fn key_call_is_free_ranging() {
        let (class, _) = StreamabilityAnalyzer::classify_text("key('k', .)");
        assert_eq!(class, Streamability::FreeRanging);
    }

    #[test]
    fn plain_child_step_is_consuming() {
        let (class, reasons) = StreamabilityAnalyzer::classify_text("a/b/c");
        assert_eq!(class, Streamability::Consuming);
        assert!(reasons.is_empty());
    }

    #[test]
    fn double_slash_needs_a_predicate_to_be_free_ranging() {
        let (class, _) = StreamabilityAnalyzer::classify_text("//foo");
        assert_eq!(class, Streamability::Consuming);
        let (class, _) = StreamabilityAnalyzer::classify_text("//foo[1]");
        assert_eq!(class, Streamability::FreeRanging);
    }

    #[test]
    fn template_combines_body_and_pattern() {
        let result = StreamabilityAnalyzer::classify_template(Streamability::Consuming, Some("foo[parent::bar]"));
        assert_eq!(result.classification, Streamability::Grounded);
        assert_eq!(result.buffering, BufferingStrategy::Grounded);
    }

    #[test]
    fn stylesheet_level_is_max_of_templates() {
        let t1 = StreamabilityAnalyzer::classify_template(Streamability::Consuming, None);
        let t2 = StreamabilityAnalyzer::classify_template(Streamability::Motionless, Some("id('x')"));
        let result = StreamabilityAnalyzer::classify_stylesheet([&t1, &t2]);
        assert_eq!(result.classification, Streamability::FreeRanging);
    }
}
