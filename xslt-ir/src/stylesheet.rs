//! `CompiledStylesheet` and its `Builder` (§3 "CompiledStylesheet", §4.6).

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};

use xslt_name::ExpandedName;
use xslt_pattern::{Pattern, StreamabilityAnalyzer, StreamabilityResult};

use crate::declarations::{
    AccumulatorDefinition, AttributeSet, CharacterMap, DecimalFormat, GlobalVariable,
    ImportedSchema, KeyDefinition, KeyRule, ModeDeclaration, NamespaceAlias, OutputProperties,
    TemplateRule, UserFunction, ValidationMode, XsltVersion, DEFAULT_MODE_KEY,
};
use crate::error::BuilderError;

/// §3's immutable aggregate. Every accessor is a plain field read; all
/// invariants were already checked by the time `Builder::build()`
/// produced this value (§5 "deeply immutable after `build()` returns").
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStylesheet<E, B> {
    pub template_rules: Vec<TemplateRule<E, B>>,
    pub named_templates: HashMap<ExpandedName, TemplateRule<E, B>>,
    pub global_variables: Vec<GlobalVariable<E, B>>,
    pub attribute_sets: HashMap<ExpandedName, AttributeSet<E, B>>,
    pub output_properties: OutputProperties,
    pub keys: HashMap<ExpandedName, KeyDefinition<E>>,
    pub namespace_aliases: HashMap<String, NamespaceAlias>,
    pub strip_space_patterns: Vec<Pattern<E>>,
    pub preserve_space_patterns: Vec<Pattern<E>>,
    pub decimal_formats: HashMap<String, DecimalFormat>,
    pub accumulators: HashMap<String, AccumulatorDefinition<E>>,
    pub modes: HashMap<String, ModeDeclaration>,
    pub namespace_bindings: HashMap<String, String>,
    pub excluded_result_namespaces: HashSet<String>,
    pub functions: HashMap<String, UserFunction<B>>,
    pub imported_schemas: HashMap<String, ImportedSchema>,
    pub character_maps: HashMap<String, CharacterMap>,
    pub default_validation_mode: ValidationMode,
    pub base_uri: String,
    pub version: XsltVersion,
    pub streamability: StreamabilityResult,
}

impl<E, B> CompiledStylesheet<E, B> {
    /// §8: "every attribute-set name referenced by `useAttributeSets` is
    /// present as a key" — exposed so callers/tests can restate the
    /// invariant directly rather than trusting `build()` blindly.
    pub fn attribute_set_references_resolve(&self) -> bool {
        self.attribute_sets
            .values()
            .flat_map(|set| set.uses.iter())
            .all(|name| self.attribute_sets.contains_key(name))
    }

    /// Whitespace-strip lookup for a given element name (§4.6, §9 open
    /// question: matched by pattern-style name/wildcard test the same
    /// way a `NameTest` pattern would, not full XSLT precedence rules —
    /// see DESIGN.md).
    pub fn strips_whitespace(&self, uri: Option<&str>, local: &str) -> bool {
        let preserved = self
            .preserve_space_patterns
            .iter()
            .any(|p| name_test_matches(p, uri, local));
        if preserved {
            return false;
        }
        self.strip_space_patterns
            .iter()
            .any(|p| name_test_matches(p, uri, local))
    }
}

fn name_test_matches<E>(pattern: &Pattern<E>, uri: Option<&str>, local: &str) -> bool {
    use xslt_pattern::PatternVariant;
    match &pattern.variant {
        PatternVariant::NameTest { node_test, .. } => match node_test {
            xslt_pattern::NodeTest::Element { name, .. } => name.matches(uri, local),
            _ => false,
        },
        _ => false,
    }
}

/// §4.6. Accumulates declarations, enforcing add-time invariants as they
/// arrive and whole-sheet invariants in [`Builder::build`].
pub struct Builder<E, B> {
    template_rules: Vec<TemplateRule<E, B>>,
    named_templates: HashMap<ExpandedName, TemplateRule<E, B>>,
    global_variables: Vec<GlobalVariable<E, B>>,
    attribute_sets: HashMap<ExpandedName, AttributeSet<E, B>>,
    output_properties: OutputProperties,
    keys: HashMap<ExpandedName, KeyDefinition<E>>,
    namespace_aliases: HashMap<String, NamespaceAlias>,
    strip_space_patterns: Vec<Pattern<E>>,
    preserve_space_patterns: Vec<Pattern<E>>,
    decimal_formats: HashMap<String, DecimalFormat>,
    accumulators: HashMap<String, AccumulatorDefinition<E>>,
    modes: HashMap<String, ModeDeclaration>,
    namespace_bindings: HashMap<String, String>,
    excluded_result_namespaces: HashSet<String>,
    functions: HashMap<String, UserFunction<B>>,
    imported_schemas: HashMap<String, ImportedSchema>,
    character_maps: HashMap<String, CharacterMap>,
    default_validation_mode: ValidationMode,
    base_uri: String,
    version: XsltVersion,
}

impl<E: Clone, B: Clone> Builder<E, B> {
    pub fn new(base_uri: impl Into<String>, version: XsltVersion) -> Self {
        Self {
            template_rules: Vec::new(),
            named_templates: HashMap::new(),
            global_variables: Vec::new(),
            attribute_sets: HashMap::new(),
            output_properties: OutputProperties::default(),
            keys: HashMap::new(),
            namespace_aliases: HashMap::new(),
            strip_space_patterns: Vec::new(),
            preserve_space_patterns: Vec::new(),
            decimal_formats: HashMap::new(),
            accumulators: HashMap::new(),
            modes: HashMap::new(),
            namespace_bindings: HashMap::new(),
            excluded_result_namespaces: HashSet::new(),
            functions: HashMap::new(),
            imported_schemas: HashMap::new(),
            character_maps: HashMap::new(),
            default_validation_mode: ValidationMode::Strict,
            base_uri: base_uri.into(),
            version,
        }
    }

    pub fn add_template_rule(&mut self, rule: TemplateRule<E, B>) {
        if let Some(name) = rule.name.clone() {
            self.named_templates.entry(name).or_insert_with(|| rule.clone());
        }
        self.template_rules.push(rule);
    }

    /// Global variables de-duplicate by expanded name with last-wins
    /// *within a single builder* (§4.6); merging a whole imported sheet
    /// uses first-wins instead, which is why this and [`Builder::merge`]
    /// implement two different rules over the same field.
    pub fn add_global_variable(&mut self, variable: GlobalVariable<E, B>) {
        if let Some(existing) = self
            .global_variables
            .iter_mut()
            .find(|v| v.name == variable.name)
        {
            *existing = variable;
        } else {
            self.global_variables.push(variable);
        }
    }

    pub fn add_attribute_set(&mut self, set: AttributeSet<E, B>) {
        match self.attribute_sets.get(&set.name) {
            Some(earlier) => {
                let merged = set.merge_over(earlier);
                self.attribute_sets.insert(merged.name.clone(), merged);
            }
            None => {
                self.attribute_sets.insert(set.name.clone(), set);
            }
        }
    }

    pub fn add_key_rule(&mut self, name: ExpandedName, rule: KeyRule<E>) {
        self.keys
            .entry(name.clone())
            .or_insert_with(|| KeyDefinition {
                name,
                rules: Vec::new(),
            })
            .rules
            .push(rule);
    }

    pub fn add_function(&mut self, function: UserFunction<B>) {
        self.functions.insert(function.lookup_key(), function);
    }

    pub fn add_accumulator(&mut self, accumulator: AccumulatorDefinition<E>) {
        self.accumulators
            .entry(accumulator.name.clone())
            .or_insert(accumulator);
    }

    pub fn add_mode(&mut self, mode: ModeDeclaration) {
        let key = mode.key().to_string();
        self.modes.entry(key).or_insert(mode);
    }

    pub fn add_namespace_alias(&mut self, alias: NamespaceAlias) {
        self.namespace_aliases
            .entry(alias.stylesheet_uri.clone())
            .or_insert(alias);
    }

    pub fn add_decimal_format(&mut self, name: impl Into<String>, format: DecimalFormat) {
        self.decimal_formats.entry(name.into()).or_insert(format);
    }

    pub fn add_character_map(&mut self, map: CharacterMap) {
        self.character_maps.entry(map.name.clone()).or_insert(map);
    }

    pub fn add_imported_schema(&mut self, schema: ImportedSchema) {
        self.imported_schemas
            .entry(schema.target_namespace.clone())
            .or_insert(schema);
    }

    pub fn add_strip_space_pattern(&mut self, pattern: Pattern<E>) {
        self.strip_space_patterns.push(pattern);
    }

    pub fn add_preserve_space_pattern(&mut self, pattern: Pattern<E>) {
        self.preserve_space_patterns.push(pattern);
    }

    pub fn bind_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.namespace_bindings.insert(prefix.into(), uri.into());
    }

    /// Accepts `#all` and `#default` tokens, not just explicit prefixes
    /// (SUPPLEMENTED FEATURE, `SPEC_FULL.md`). `#all` excludes every
    /// namespace currently bound on this sheet; `#default` excludes the
    /// stylesheet's default element namespace if one is bound under the
    /// empty prefix.
    pub fn exclude_result_prefixes<'a>(&mut self, tokens: impl IntoIterator<Item = &'a str>) {
        for token in tokens {
            match token {
                "#all" => {
                    let uris: Vec<String> = self.namespace_bindings.values().cloned().collect();
                    self.excluded_result_namespaces.extend(uris);
                }
                "#default" => {
                    if let Some(uri) = self.namespace_bindings.get("") {
                        self.excluded_result_namespaces.insert(uri.clone());
                    }
                }
                prefix => {
                    if let Some(uri) = self.namespace_bindings.get(prefix) {
                        self.excluded_result_namespaces.insert(uri.clone());
                    }
                }
            }
        }
    }

    pub fn merge_output_properties(&mut self, properties: &OutputProperties) {
        self.output_properties = self.output_properties.merge(properties);
    }

    pub fn set_default_validation_mode(&mut self, mode: ValidationMode) {
        self.default_validation_mode = mode;
    }

    /// §4.6 `merge(imported, is_import)`. `is_import` only affects
    /// template-rule precedence tagging at the call site (the caller
    /// assigns `import_precedence` via [`crate::resolver::StylesheetResolver`]
    /// before calling this); every other column of the merge table
    /// behaves identically for import and include, so it is not a
    /// parameter here.
    pub fn merge(&mut self, imported: CompiledStylesheet<E, B>) {
        self.template_rules.extend(imported.template_rules);
        for (name, rule) in imported.named_templates {
            self.named_templates.entry(name).or_insert(rule);
        }
        for variable in imported.global_variables {
            if !self.global_variables.iter().any(|v| v.name == variable.name) {
                self.global_variables.push(variable);
            }
        }
        for (name, set) in imported.attribute_sets {
            match self.attribute_sets.remove(&name) {
                Some(current) => {
                    self.attribute_sets.insert(name, current.merge_over(&set));
                }
                None => {
                    self.attribute_sets.insert(name, set);
                }
            }
        }
        self.output_properties = self.output_properties.merge(&imported.output_properties);
        for (name, key) in imported.keys {
            self.keys.entry(name).or_insert(key);
        }
        for (uri, alias) in imported.namespace_aliases {
            self.namespace_aliases.entry(uri).or_insert(alias);
        }
        self.strip_space_patterns.extend(imported.strip_space_patterns);
        self.preserve_space_patterns
            .extend(imported.preserve_space_patterns);
        for (name, format) in imported.decimal_formats {
            self.decimal_formats.entry(name).or_insert(format);
        }
        for (name, accumulator) in imported.accumulators {
            self.accumulators.entry(name).or_insert(accumulator);
        }
        for (name, mode) in imported.modes {
            self.modes.entry(name).or_insert(mode);
        }
        for (prefix, uri) in imported.namespace_bindings {
            self.namespace_bindings.entry(prefix).or_insert(uri);
        }
        self.excluded_result_namespaces
            .extend(imported.excluded_result_namespaces);
        for (key, function) in imported.functions {
            self.functions.entry(key).or_insert(function);
        }
        for (uri, schema) in imported.imported_schemas {
            self.imported_schemas.entry(uri).or_insert(schema);
        }
        for (name, map) in imported.character_maps {
            self.character_maps.entry(name).or_insert(map);
        }
    }

    /// Whole-sheet invariants (§3): every `use-attribute-sets` reference
    /// resolves (**XTSE0710**). Pattern-level static errors (XTSE0340)
    /// were already raised by `xslt_pattern::PatternParser` at add time,
    /// since this builder only ever receives already-parsed `Pattern`
    /// values.
    pub fn build(self) -> Result<CompiledStylesheet<E, B>, BuilderError> {
        for set in self.attribute_sets.values() {
            for used in &set.uses {
                if !self.attribute_sets.contains_key(used) {
                    return Err(BuilderError::UndeclaredAttributeSet {
                        name: used.to_clark(),
                    });
                }
            }
        }

        let streamability = self.derive_streamability();

        Ok(CompiledStylesheet {
            template_rules: self.template_rules,
            named_templates: self.named_templates,
            global_variables: self.global_variables,
            attribute_sets: self.attribute_sets,
            output_properties: self.output_properties,
            keys: self.keys,
            namespace_aliases: self.namespace_aliases,
            strip_space_patterns: self.strip_space_patterns,
            preserve_space_patterns: self.preserve_space_patterns,
            decimal_formats: self.decimal_formats,
            accumulators: self.accumulators,
            modes: self.modes,
            namespace_bindings: self.namespace_bindings,
            excluded_result_namespaces: self.excluded_result_namespaces,
            functions: self.functions,
            imported_schemas: self.imported_schemas,
            character_maps: self.character_maps,
            default_validation_mode: self.default_validation_mode,
            base_uri: self.base_uri,
            version: self.version,
            streamability,
        })
    }

    /// §4.11: the stylesheet-level streamability is the max over every
    /// template, combining each rule's match-pattern source text with
    /// `consuming` as the assumed body capability (the body AST's own
    /// classification is out of scope for this core, per §1 — callers
    /// that do have a body classifier should recombine it themselves
    /// rather than trust this derived field blindly).
    fn derive_streamability(&self) -> StreamabilityResult {
        let results: Vec<StreamabilityResult> = self
            .template_rules
            .iter()
            .map(|rule| {
                let source = rule.match_pattern.as_ref().map(|p| p.source.as_str());
                StreamabilityAnalyzer::classify_template(xslt_pattern::Streamability::Consuming, source)
            })
            .collect();
        StreamabilityAnalyzer::classify_stylesheet(results.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarations::{ParamSource, Visibility};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct FakeExpr(&'static str);

    fn builder() -> Builder<FakeExpr, &'static str> {
        Builder::new("file:///main.xsl", XsltVersion::V3_0)
    }

    fn rule(name: Option<&str>, match_src: Option<&str>) -> TemplateRule<FakeExpr, &'static str> {
        let pattern = match_src.map(|src| {
            xslt_pattern::Pattern::new(
                xslt_pattern::PatternVariant::NameTest {
                    node_test: xslt_pattern::NodeTest::Element {
                        name: ExpandedName::unqualified(src),
                        type_constraint: None,
                    },
                    predicates: vec![],
                },
                src,
            )
        });
        TemplateRule::new(
            pattern,
            name.map(ExpandedName::unqualified),
            None,
            0.0,
            0,
            0,
            vec![],
            "body",
            Visibility::Public,
        )
        .unwrap()
    }

    #[test]
    fn template_without_match_or_name_is_rejected() {
        let err = TemplateRule::<FakeExpr, &str>::new(
            None,
            None,
            None,
            0.0,
            0,
            0,
            vec![],
            "body",
            Visibility::Public,
        )
        .unwrap_err();
        assert!(matches!(err, BuilderError::TemplateMissingMatchOrName));
    }

    #[test]
    fn attribute_set_merge_concatenates_uses_without_duplicates() {
        let first = AttributeSet {
            name: ExpandedName::unqualified("a"),
            uses: vec![ExpandedName::unqualified("shared"), ExpandedName::unqualified("x")],
            body: "first",
            visibility: Visibility::Public,
        };
        let second = AttributeSet {
            name: ExpandedName::unqualified("a"),
            uses: vec![ExpandedName::unqualified("shared"), ExpandedName::unqualified("y")],
            body: "second",
            visibility: Visibility::Public,
        };
        let merged = second.merge_over(&first);
        assert_eq!(merged.body, "second");
        assert_eq!(
            merged.uses,
            vec![
                ExpandedName::unqualified("shared"),
                ExpandedName::unqualified("x"),
                ExpandedName::unqualified("y"),
            ]
        );
    }

    #[test]
    fn undeclared_attribute_set_reference_fails_build() {
        let mut b = builder();
        b.add_attribute_set(AttributeSet {
            name: ExpandedName::unqualified("a"),
            uses: vec![ExpandedName::unqualified("missing")],
            body: "body",
            visibility: Visibility::Public,
        });
        let err = b.build().unwrap_err();
        assert!(matches!(err, BuilderError::UndeclaredAttributeSet { .. }));
    }

    #[test]
    fn named_templates_are_first_wins() {
        let mut b = builder();
        b.add_template_rule(rule(Some("greet"), None));
        let mut second = rule(Some("greet"), None);
        second.priority = 99.0;
        b.add_template_rule(second);
        let sheet = b.build().unwrap();
        assert_eq!(
            sheet.named_templates[&ExpandedName::unqualified("greet")].priority,
            0.0
        );
        assert_eq!(sheet.template_rules.len(), 2);
    }

    #[test]
    fn global_variables_are_last_wins_within_one_builder() {
        let mut b = builder();
        b.add_global_variable(GlobalVariable {
            name: ExpandedName::unqualified("n"),
            is_param: false,
            source: VariableSource::Select(FakeExpr("1")),
            visibility: Visibility::Public,
        });
        b.add_global_variable(GlobalVariable {
            name: ExpandedName::unqualified("n"),
            is_param: false,
            source: VariableSource::Select(FakeExpr("2")),
            visibility: Visibility::Public,
        });
        let sheet = b.build().unwrap();
        assert_eq!(sheet.global_variables.len(), 1);
        assert_eq!(sheet.global_variables[0].source, VariableSource::Select(FakeExpr("2")));
    }

    #[test]
    fn merge_prefers_current_sheet_output_properties() {
        let mut b = builder();
        b.merge_output_properties(&OutputProperties {
            indent: Some(true),
            ..OutputProperties::default()
        });
        let mut imported = CompiledStylesheetBuilderHarness::sheet();
        imported.output_properties.indent = Some(false);
        imported.output_properties.encoding = Some("utf-8".to_string());
        b.merge(imported);
        let sheet = b.build().unwrap();
        assert_eq!(sheet.output_properties.indent, Some(true));
        assert_eq!(sheet.output_properties.encoding.as_deref(), Some("utf-8"));
    }

    #[test]
    fn exclude_result_prefixes_all_excludes_every_bound_namespace() {
        let mut b = builder();
        b.bind_namespace("foo", "urn:foo");
        b.bind_namespace("bar", "urn:bar");
        b.exclude_result_prefixes(["#all"]);
        let sheet = b.build().unwrap();
        assert!(sheet.excluded_result_namespaces.contains("urn:foo"));
        assert!(sheet.excluded_result_namespaces.contains("urn:bar"));
    }

    #[test]
    fn key_rules_accumulate_under_one_name() {
        let mut b = builder();
        let pattern = xslt_pattern::Pattern::new(
            xslt_pattern::PatternVariant::NameTest {
                node_test: xslt_pattern::NodeTest::any_element(),
                predicates: vec![],
            },
            "*",
        );
        b.add_key_rule(
            ExpandedName::unqualified("by-id"),
            KeyRule {
                match_pattern: pattern.clone(),
                use_expr: FakeExpr("@id"),
            },
        );
        b.add_key_rule(
            ExpandedName::unqualified("by-id"),
            KeyRule {
                match_pattern: pattern,
                use_expr: FakeExpr("@xml:id"),
            },
        );
        let sheet = b.build().unwrap();
        assert_eq!(sheet.keys[&ExpandedName::unqualified("by-id")].rules.len(), 2);
    }

    // Test-only helper producing a minimal second stylesheet to merge.
    struct CompiledStylesheetBuilderHarness;
    impl CompiledStylesheetBuilderHarness {
        fn sheet() -> CompiledStylesheet<FakeExpr, &'static str> {
            Builder::<FakeExpr, &'static str>::new("file:///b.xsl", XsltVersion::V3_0)
                .build()
                .unwrap()
        }
    }
}
