//! Compiled-stylesheet data model, builder, resolver and package system
//! for the XSLT compiled-IR core (§3, §4.6 – §4.10).
//!
//! This crate never parses XSLT source, compiles XPath, or executes a
//! transformation; it only assembles the declarations a caller hands it
//! (already-parsed [`xslt_pattern::Pattern`]s, opaque expression/body
//! handles) into the immutable aggregate §3 describes, and enforces the
//! builder-, resolver- and package-level invariants around it.

mod accept_override;
mod declarations;
mod error;
mod package;
mod package_resolver;
mod resolver;
mod stylesheet;

pub use accept_override::{
    check_abstract_components_overridden, is_visible_outside_package, AcceptDeclaration,
    ComponentType, OverrideDeclaration,
};
pub use declarations::{
    AccumulatorDefinition, AccumulatorPhase, AccumulatorRule, AttributeSet, CharacterMap,
    DecimalFormat, FunctionParameter, GlobalVariable, ImportedSchema, KeyDefinition, KeyRule,
    ModeDeclaration, NamespaceAlias, OnNoMatch, OutputMethod, OutputProperties, ParamSource,
    TemplateParameter, TemplateRule, UserFunction, ValidationMode, VariableSource, Visibility,
    XsltVersion, DEFAULT_MODE_KEY,
};
pub use error::{BuilderError, CompileError, CompileResult, PackageError, ResolverError};
pub use package::{CompiledPackage, PackageDependency};
pub use package_resolver::{compare_versions, version_matches, PackageCompiler, PackageResolver};
pub use resolver::{resolve_uri, LoadGuard, SourceResolver, StylesheetResolver};
pub use stylesheet::{Builder, CompiledStylesheet};
