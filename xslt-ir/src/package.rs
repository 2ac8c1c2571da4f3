//! `CompiledPackage` (§4.8): a `CompiledStylesheet` plus the
//! component-visibility overlay that makes it a unit of modularity.

use std::sync::{Arc, OnceLock};

use ahash::{HashMap, HashMapExt};

use crate::accept_override::{AcceptDeclaration, OverrideDeclaration};
use crate::declarations::{clark_key, Visibility};
use crate::stylesheet::CompiledStylesheet;

/// A component is accessible from outside its package iff its effective
/// visibility is one of these (§4.8).
pub(crate) fn is_accessible(visibility: Visibility) -> bool {
    matches!(
        visibility,
        Visibility::Public | Visibility::Final | Visibility::Abstract
    )
}

/// A component is overridable iff its effective visibility is one of
/// these (§4.8).
pub(crate) fn is_overridable(visibility: Visibility) -> bool {
    matches!(visibility, Visibility::Public | Visibility::Abstract)
}

/// One `use-package` reference (§3, §4.8): the used package's name and
/// version constraint, the `xsl:accept`/`xsl:override` declarations this
/// package applies to it, and the target package itself, resolved
/// lazily by whoever drives package compilation (typically a
/// [`crate::package_resolver::PackageResolver`]) and cached here so it's
/// resolved at most once per dependency.
pub struct PackageDependency<E, B> {
    /// The used package's name, an absolute URI (§4.9).
    pub name_uri: String,
    /// The version constraint as written on `use-package` (exact,
    /// prefix wildcard, range, or `*`; see [`crate::package_resolver`]).
    pub version_constraint: String,
    /// `xsl:accept` declarations applied to the used package, in
    /// declaration order (§4.10).
    pub accepts: Vec<AcceptDeclaration>,
    /// `xsl:override` declarations applied to the used package, in
    /// declaration order (§4.10).
    pub overrides: Vec<OverrideDeclaration>,
    target: OnceLock<Arc<CompiledPackage<E, B>>>,
}

impl<E, B> PackageDependency<E, B> {
    pub fn new(name_uri: impl Into<String>, version_constraint: impl Into<String>) -> Self {
        Self {
            name_uri: name_uri.into(),
            version_constraint: version_constraint.into(),
            accepts: Vec::new(),
            overrides: Vec::new(),
            target: OnceLock::new(),
        }
    }

    /// The resolved target package, if [`Self::resolve_with`] has already
    /// been called (or the target was never needed, e.g. during a dry
    /// static check).
    pub fn target(&self) -> Option<&Arc<CompiledPackage<E, B>>> {
        self.target.get()
    }

    /// Resolve the target package on first access, via `resolver`, and
    /// cache it for the lifetime of this dependency. Later calls reuse
    /// the cached target and ignore `resolver`.
    pub fn resolve_with<F, Err>(&self, resolver: F) -> Result<&Arc<CompiledPackage<E, B>>, Err>
    where
        F: FnOnce() -> Result<Arc<CompiledPackage<E, B>>, Err>,
    {
        if let Some(target) = self.target.get() {
            return Ok(target);
        }
        let target = resolver()?;
        Ok(self.target.get_or_init(|| target))
    }
}

/// Wraps a [`CompiledStylesheet`] with its package identity, ordered
/// dependency list, and the visibility-override map
/// `use-package`/`xsl:accept`/`xsl:override` declarations build up
/// (§4.8, §4.10). `E`/`B` are the same injected handle types the wrapped
/// stylesheet carries.
pub struct CompiledPackage<E, B> {
    pub stylesheet: CompiledStylesheet<E, B>,
    /// The package's own name, an absolute URI (§3, §4.8, §4.9).
    pub name_uri: String,
    /// The package's version string (§3, §4.8, §4.9).
    pub version: String,
    /// `use-package` dependencies, in declaration order (§3, §4.8).
    pub dependencies: Vec<PackageDependency<E, B>>,
    /// Stable component key → overridden visibility, applied on top of
    /// the component's own declared visibility (§4.8, §4.10).
    visibility_overrides: HashMap<String, Visibility>,
}

impl<E, B> CompiledPackage<E, B> {
    pub fn new(
        stylesheet: CompiledStylesheet<E, B>,
        name_uri: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            stylesheet,
            name_uri: name_uri.into(),
            version: version.into(),
            dependencies: Vec::new(),
            visibility_overrides: HashMap::new(),
        }
    }

    pub fn add_dependency(&mut self, dependency: PackageDependency<E, B>) {
        self.dependencies.push(dependency);
    }

    /// Set (or replace) the effective visibility of the component
    /// identified by `key`, as an `xsl:accept` declaration does (§4.10).
    pub fn set_visibility_override(&mut self, key: impl Into<String>, visibility: Visibility) {
        self.visibility_overrides.insert(key.into(), visibility);
    }

    /// The effective visibility of a component: the override if
    /// present, otherwise its own declared visibility (§4.8).
    pub fn effective_visibility(&self, key: &str, declared: Visibility) -> Visibility {
        self.visibility_overrides
            .get(key)
            .copied()
            .unwrap_or(declared)
    }

    pub(crate) fn named_template_components(&self) -> impl Iterator<Item = (String, Visibility)> + '_ {
        self.stylesheet.named_templates.values().map(|rule| {
            let key = rule.component_key();
            let visibility = self.effective_visibility(&key, rule.visibility);
            (key, visibility)
        })
    }

    pub(crate) fn function_components(&self) -> impl Iterator<Item = (String, Visibility)> + '_ {
        self.stylesheet.functions.values().map(|function| {
            let key = function.component_key();
            let visibility = self.effective_visibility(&key, function.visibility);
            (key, visibility)
        })
    }

    pub(crate) fn variable_components(&self) -> impl Iterator<Item = (String, Visibility)> + '_ {
        self.stylesheet.global_variables.iter().map(|variable| {
            let key = clark_key(&variable.name);
            let visibility = self.effective_visibility(&key, variable.visibility);
            (key, visibility)
        })
    }

    pub(crate) fn attribute_set_components(&self) -> impl Iterator<Item = (String, Visibility)> + '_ {
        self.stylesheet.attribute_sets.values().map(|set| {
            let key = clark_key(&set.name);
            let visibility = self.effective_visibility(&key, set.visibility);
            (key, visibility)
        })
    }

    pub(crate) fn mode_components(&self) -> impl Iterator<Item = (String, Visibility)> + '_ {
        self.stylesheet.modes.values().map(|mode| {
            let key = mode.key().to_string();
            let visibility = self.effective_visibility(&key, mode.visibility);
            (key, visibility)
        })
    }

    /// Named templates whose effective visibility is `abstract` (§4.8).
    pub fn abstract_templates(&self) -> Vec<String> {
        self.named_template_components()
            .filter(|(_, v)| *v == Visibility::Abstract)
            .map(|(key, _)| key)
            .collect()
    }

    /// Functions whose effective visibility is `abstract` (§4.8).
    pub fn abstract_functions(&self) -> Vec<String> {
        self.function_components()
            .filter(|(_, v)| *v == Visibility::Abstract)
            .map(|(key, _)| key)
            .collect()
    }

    /// Global variables whose effective visibility is `abstract` (§4.8).
    pub fn abstract_variables(&self) -> Vec<String> {
        self.variable_components()
            .filter(|(_, v)| *v == Visibility::Abstract)
            .map(|(key, _)| key)
            .collect()
    }

    /// True if any component in the package (of any kind) has an
    /// effective visibility of `abstract`; such a package cannot be
    /// used as a stand-alone stylesheet (§4.8).
    pub fn has_abstract_components(&self) -> bool {
        self.named_template_components()
            .chain(self.function_components())
            .chain(self.variable_components())
            .chain(self.attribute_set_components())
            .chain(self.mode_components())
            .any(|(_, v)| v == Visibility::Abstract)
    }

    /// Every component's stable key paired with its effective
    /// visibility, across every component kind (§4.8). Used by
    /// `xsl:accept`/`xsl:override` processing (§4.10), which needs to
    /// look a key up without knowing its kind in advance.
    pub fn component_visibilities(&self) -> HashMap<String, Visibility> {
        let mut map = HashMap::new();
        for (key, visibility) in self
            .named_template_components()
            .chain(self.function_components())
            .chain(self.variable_components())
            .chain(self.attribute_set_components())
            .chain(self.mode_components())
        {
            map.insert(key, visibility);
        }
        map
    }
}
