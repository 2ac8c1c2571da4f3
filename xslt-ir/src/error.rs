//! The error taxonomy of §7: static pattern errors, builder integrity
//! errors, resolver errors and package errors, composed into one
//! top-level failure channel per declaration's compile step.

use thiserror::Error;

/// §4.6 builder-time failures: declaration-level and whole-sheet
/// invariants enforced by [`crate::stylesheet::Builder`].
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("XTSE0710: use-attribute-sets references undeclared attribute set {name}")]
    UndeclaredAttributeSet { name: String },

    #[error("a template must declare at least one of match or name")]
    TemplateMissingMatchOrName,

    #[error("global variable {name} declares neither a select expression nor default content")]
    VariableMissingSource { name: String },

    #[error(transparent)]
    Pattern(#[from] xslt_pattern::ParserError),
}

/// §4.7 `StylesheetResolver` failures: circular imports/includes and
/// URI resolution, collapsed into the "single error kind carrying the
/// underlying cause" the spec calls for.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("circular reference: {uri} is already being compiled")]
    CircularReference { uri: String },

    #[error("failed to resolve {href} against base {base}: {message}")]
    Resolution {
        href: String,
        base: String,
        message: String,
    },
}

/// §4.9/§4.10 `PackageResolver` and accept/override failures.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("XTSE3015: circular reference while resolving package {name}#{version}")]
    CircularPackage { name: String, version: String },

    #[error("XTSE3020: failed to resolve package {name} (constraint {version_constraint}): {message}")]
    ResolutionFailed {
        name: String,
        version_constraint: String,
        message: String,
    },

    #[error("XTSE3005: override target {key} has effective visibility final")]
    OverrideOfFinal { key: String },

    #[error("XTSE3010: abstract component {key} was not overridden")]
    UnimplementedAbstract { key: String },

    #[error("override names a component key {key} that does not exist in the used package")]
    UnknownOverrideTarget { key: String },
}

/// The single top-level failure channel (§7): "a kind tag, a human
/// message, and an optional cause." Each variant composes one of the
/// component error enums via `#[from]`, matching the teacher's
/// `Error::XPath(xee_xpath_ast::ParserError)`-style composition.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Builder(#[from] BuilderError),

    #[error(transparent)]
    Resolver(#[from] ResolverError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Pattern(#[from] xslt_pattern::ParserError),
}

pub type CompileResult<T> = Result<T, CompileError>;
