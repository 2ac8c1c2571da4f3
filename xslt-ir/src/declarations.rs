//! Declaration value types (§3): the immutable objects a
//! [`crate::stylesheet::Builder`] accumulates and a built
//! [`crate::stylesheet::CompiledStylesheet`] holds by value.
//!
//! Every declaration is generic over two injected handle types, mirroring
//! how `xslt-pattern` stays out of the XPath-parsing business: `E` is a
//! compiled XPath expression handle (the same `E` a
//! [`xslt_pattern::Pattern`] is parameterized over), and `B` is an opaque
//! sequence-constructor body handle. Neither is ever inspected here.

use ahash::{HashMap, HashMapExt};

use xslt_name::ExpandedName;
use xslt_pattern::Pattern;

use crate::error::BuilderError;

/// Stable-key rendering of an expanded name (§4.8): Clark notation with
/// the no-namespace `{}` marker stripped, so an unqualified component
/// gets the bare key `helper` rather than `{}helper`. Component stable
/// keys are compared by plain string equality against caller-supplied
/// `xsl:accept`/`xsl:override` names, which name unqualified components
/// without any namespace marker.
pub(crate) fn clark_key(name: &ExpandedName) -> String {
    let clark = name.to_clark();
    clark.strip_prefix("{}").map(str::to_string).unwrap_or(clark)
}

/// Per-component access level (§6 "Visibility values").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
    Final,
    Abstract,
    Hidden,
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Private
    }
}

/// `xsl:mode`'s `on-no-match` policy (§6 "OnNoMatch values").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnNoMatch {
    ShallowCopy,
    DeepCopy,
    TextOnlyCopy,
    ShallowSkip,
    DeepSkip,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMethod {
    Xml,
    Html,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Strict,
    Lax,
    Preserve,
    Strip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XsltVersion {
    V1_0,
    V2_0,
    V3_0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorPhase {
    PreDescent,
    PostDescent,
}

/// A template parameter's content: exactly one of a select expression or
/// default sequence-constructor content, per §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSource<E, B> {
    Select(E),
    Content(B),
    /// Neither `select` nor a non-empty body was given; the effective
    /// default is an empty sequence.
    Implicit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParameter<E, B> {
    pub name: ExpandedName,
    pub source: ParamSource<E, B>,
    pub tunnel: bool,
    pub required: bool,
}

/// §3 TemplateRule. Invariant (at least one of match/name) is enforced by
/// [`TemplateRule::new`], never by the field shape alone, matching the
/// teacher's preference for smart constructors over unrepresentable-state
/// types when the invariant spans two optional fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRule<E, B> {
    pub match_pattern: Option<Pattern<E>>,
    pub name: Option<ExpandedName>,
    pub mode: Option<String>,
    pub priority: f64,
    pub import_precedence: i64,
    pub declaration_index: u64,
    pub params: Vec<TemplateParameter<E, B>>,
    pub body: B,
    pub visibility: Visibility,
}

impl<E, B> TemplateRule<E, B> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        match_pattern: Option<Pattern<E>>,
        name: Option<ExpandedName>,
        mode: Option<String>,
        priority: f64,
        import_precedence: i64,
        declaration_index: u64,
        params: Vec<TemplateParameter<E, B>>,
        body: B,
        visibility: Visibility,
    ) -> Result<Self, BuilderError> {
        if match_pattern.is_none() && name.is_none() {
            return Err(BuilderError::TemplateMissingMatchOrName);
        }
        Ok(Self {
            match_pattern,
            name,
            mode,
            priority,
            import_precedence,
            declaration_index,
            params,
            body,
            visibility,
        })
    }

    /// The stable component key used by packages (§4.8): `name:NAME` for
    /// named templates, `match:PATTERN:mode:MODE` for match templates.
    /// A rule declaring both uses its name, matching lookup by name
    /// taking precedence over lookup by pattern in the runtime this core
    /// feeds.
    pub fn component_key(&self) -> String {
        if let Some(name) = &self.name {
            format!("name:{}", clark_key(name))
        } else {
            let pattern = self
                .match_pattern
                .as_ref()
                .map(|p| p.source.clone())
                .unwrap_or_default();
            let mode = self.mode.as_deref().unwrap_or("#default");
            format!("match:{pattern}:mode:{mode}")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableSource<E, B> {
    Select(E),
    Content(B),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalVariable<E, B> {
    pub name: ExpandedName,
    pub is_param: bool,
    pub source: VariableSource<E, B>,
    pub visibility: Visibility,
}

/// §3 AttributeSet, with the merge rule ("later-declared attributes
/// override earlier ones, referenced-set lists concatenated without
/// duplicates") implemented as an inherent method rather than inlined
/// into the builder, so it reads the same way whether it fires at
/// same-sheet redeclaration or at import merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSet<E, B> {
    pub name: ExpandedName,
    pub uses: Vec<ExpandedName>,
    pub body: B,
    pub visibility: Visibility,
}

impl<E: Clone, B: Clone> AttributeSet<E, B> {
    /// `self` is the later declaration, `earlier` the one already present
    /// under the same name.
    pub fn merge_over(&self, earlier: &Self) -> Self {
        let mut uses = earlier.uses.clone();
        for name in &self.uses {
            if !uses.contains(name) {
                uses.push(name.clone());
            }
        }
        Self {
            name: self.name.clone(),
            uses,
            body: self.body.clone(),
            visibility: self.visibility,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyRule<E> {
    pub match_pattern: Pattern<E>,
    pub use_expr: E,
}

/// §3 KeyDefinition. `rules` holds every `xsl:key` declared under this
/// name within one compile; real stylesheets commonly declare several
/// `xsl:key`s sharing a name, each contributing to the same key's match
/// set (an open detail the distilled spec's singular "match pattern, use
/// expression" wording doesn't spell out — see DESIGN.md).
#[derive(Debug, Clone, PartialEq)]
pub struct KeyDefinition<E> {
    pub name: ExpandedName,
    pub rules: Vec<KeyRule<E>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParameter {
    pub name: ExpandedName,
    pub declared_type: Option<String>,
}

/// §3 UserFunction. Lookup key `{uri}local/arity` per §4.8. Not
/// generic over `E`: a function's parameter types are declared as plain
/// sequence-type text (like every other declared type in this crate),
/// and only its body needs a compiled-expression handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFunction<B> {
    pub uri: String,
    pub local: String,
    pub params: Vec<FunctionParameter>,
    pub body: B,
    pub declared_return_type: Option<String>,
    pub import_precedence: i64,
    pub cached: bool,
    pub visibility: Visibility,
}

impl<B> UserFunction<B> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        uri: impl Into<String>,
        local: impl Into<String>,
        params: Vec<FunctionParameter>,
        body: B,
        declared_return_type: Option<String>,
        import_precedence: i64,
        cached: bool,
        visibility: Visibility,
    ) -> Self {
        Self {
            uri: uri.into(),
            local: local.into(),
            params,
            body,
            declared_return_type,
            import_precedence,
            cached,
            visibility,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// `{uri}local/arity` (§4.8).
    pub fn lookup_key(&self) -> String {
        format!("{{{}}}{}/{}", self.uri, self.local, self.arity())
    }

    /// `{URI}LOCAL#ARITY`, the stable component identifier used by
    /// packages (§4.8), distinct from [`Self::lookup_key`]'s `/`
    /// separator since the two tables use different conventions in the
    /// spec text.
    pub fn component_key(&self) -> String {
        format!("{{{}}}{}#{}", self.uri, self.local, self.arity())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorRule<E> {
    pub match_pattern: Pattern<E>,
    pub phase: AccumulatorPhase,
    pub new_value: E,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorDefinition<E> {
    pub name: String,
    pub initial_value: E,
    pub rules: Vec<AccumulatorRule<E>>,
    pub streamable: bool,
    pub declared_type: Option<String>,
}

/// §3 ModeDeclaration. `name: None` is the unnamed/default mode, stored
/// under the `#default` key everywhere a map is keyed by mode name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeDeclaration {
    pub name: Option<String>,
    pub streamable: bool,
    pub on_no_match: OnNoMatch,
    pub visibility: Visibility,
    pub accumulators: Vec<String>,
    pub typed: bool,
    pub warning: bool,
}

pub const DEFAULT_MODE_KEY: &str = "#default";

impl ModeDeclaration {
    pub fn key(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_MODE_KEY)
    }
}

/// §3/§6 OutputProperties. `extra` is the SUPPLEMENTED-FEATURES bag for
/// every serialization parameter beyond the named core fields (see
/// `SPEC_FULL.md`), keeping the named surface closed-form while still
/// carrying e.g. `item-separator` / `undeclare-prefixes` /
/// `normalization-form`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputProperties {
    pub method: OutputMethod,
    pub version: Option<String>,
    pub encoding: Option<String>,
    pub omit_xml_declaration: Option<bool>,
    pub standalone: Option<bool>,
    pub doctype_public: Option<String>,
    pub doctype_system: Option<String>,
    pub cdata_section_elements: Vec<ExpandedName>,
    pub indent: Option<bool>,
    pub media_type: Option<String>,
    pub extra: HashMap<String, String>,
}

impl Default for OutputProperties {
    fn default() -> Self {
        Self {
            method: OutputMethod::Xml,
            version: None,
            encoding: None,
            omit_xml_declaration: None,
            standalone: None,
            doctype_public: None,
            doctype_system: None,
            cdata_section_elements: Vec::new(),
            indent: None,
            media_type: None,
            extra: HashMap::new(),
        }
    }
}

impl OutputProperties {
    /// Left-to-right merge (§4.6): `self` is the current sheet, `imported`
    /// is "merged under" it, so a field already set on `self` always
    /// wins. Matches the `Include (same precedence)` column's "imported
    /// merged over current" by simply calling this with the arguments
    /// swapped at the call site.
    pub fn merge(&self, imported: &Self) -> Self {
        Self {
            method: self.method,
            version: self.version.clone().or_else(|| imported.version.clone()),
            encoding: self.encoding.clone().or_else(|| imported.encoding.clone()),
            omit_xml_declaration: self.omit_xml_declaration.or(imported.omit_xml_declaration),
            standalone: self.standalone.or(imported.standalone),
            doctype_public: self
                .doctype_public
                .clone()
                .or_else(|| imported.doctype_public.clone()),
            doctype_system: self
                .doctype_system
                .clone()
                .or_else(|| imported.doctype_system.clone()),
            cdata_section_elements: if self.cdata_section_elements.is_empty() {
                imported.cdata_section_elements.clone()
            } else {
                self.cdata_section_elements.clone()
            },
            indent: self.indent.or(imported.indent),
            media_type: self
                .media_type
                .clone()
                .or_else(|| imported.media_type.clone()),
            extra: {
                let mut merged = imported.extra.clone();
                merged.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
                merged
            },
        }
    }
}

/// §6 decimal-format defaults, filled in for any character slot absent
/// from the declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalFormat {
    pub decimal_separator: char,
    pub grouping_separator: char,
    pub infinity: String,
    pub minus_sign: char,
    pub nan: String,
    pub percent: char,
    pub per_mille: char,
    pub zero_digit: char,
    pub digit: char,
    pub pattern_separator: char,
}

impl Default for DecimalFormat {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            grouping_separator: ',',
            infinity: "Infinity".to_string(),
            minus_sign: '-',
            nan: "NaN".to_string(),
            percent: '%',
            per_mille: '\u{2030}',
            zero_digit: '0',
            digit: '#',
            pattern_separator: ';',
        }
    }
}

/// §3 NamespaceAlias, keyed by stylesheet URI in
/// [`crate::stylesheet::CompiledStylesheet::namespace_aliases`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceAlias {
    pub stylesheet_uri: String,
    pub result_uri: String,
    pub result_prefix: Option<String>,
}

/// SUPPLEMENTED FEATURE: `xsl:character-map` (`SPEC_FULL.md`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterMap {
    pub name: String,
    pub mappings: HashMap<char, String>,
}

/// SUPPLEMENTED FEATURE: `xsl:import-schema`, either form collapsing to
/// the same target-namespace key (`SPEC_FULL.md`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSchema {
    pub target_namespace: String,
    pub location: Option<String>,
}
