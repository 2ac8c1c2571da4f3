//! `xsl:accept` and `xsl:override` declarations (§4.10): filtering and
//! replacing components of a used package.

use regex::Regex;

use crate::declarations::Visibility;
use crate::error::PackageError;
use crate::package::{is_accessible, CompiledPackage};

/// The component-type selector an `xsl:accept`/`xsl:override` names
/// (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Template,
    Function,
    Variable,
    AttributeSet,
    Mode,
    Any,
}

/// Translate one EQName wildcard pattern to an anchored regular
/// expression: `.`, `{`, `}` are escaped, `*` becomes `.*`, every other
/// character is taken literally (§4.10).
fn wildcard_regex(pattern: &str) -> Regex {
    let mut translated = String::with_capacity(pattern.len() + 2);
    translated.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => translated.push_str(".*"),
            '.' | '{' | '}' => {
                translated.push('\\');
                translated.push(ch);
            }
            other => translated.push(other),
        }
    }
    translated.push('$');
    Regex::new(&translated).expect("escaped literal plus `.*` is always a valid regex")
}

fn matches_any(patterns: &[Regex], key: &str) -> bool {
    patterns.iter().any(|re| re.is_match(key))
}

/// §4.10 `AcceptDeclaration`: filters components of a given type from a
/// used package by name, setting their effective visibility to
/// `visibility` (commonly `hidden`, `private`, or `final`).
pub struct AcceptDeclaration {
    pub component_type: ComponentType,
    pub name_patterns: Vec<String>,
    pub visibility: Visibility,
}

impl AcceptDeclaration {
    /// Apply this declaration to every matching component of `package`,
    /// overriding its effective visibility.
    pub fn apply<E, B>(&self, package: &mut CompiledPackage<E, B>) {
        let patterns: Vec<Regex> = self.name_patterns.iter().map(|p| wildcard_regex(p)).collect();

        let keys: Vec<String> = match self.component_type {
            ComponentType::Template => package
                .named_template_components()
                .map(|(key, _)| key)
                .collect(),
            ComponentType::Function => {
                package.function_components().map(|(key, _)| key).collect()
            }
            ComponentType::Variable => {
                package.variable_components().map(|(key, _)| key).collect()
            }
            ComponentType::AttributeSet => package
                .attribute_set_components()
                .map(|(key, _)| key)
                .collect(),
            ComponentType::Mode => package.mode_components().map(|(key, _)| key).collect(),
            ComponentType::Any => package
                .named_template_components()
                .chain(package.function_components())
                .chain(package.variable_components())
                .chain(package.attribute_set_components())
                .chain(package.mode_components())
                .map(|(key, _)| key)
                .collect(),
        };

        for key in keys {
            if matches_any(&patterns, &key) {
                package.set_visibility_override(key, self.visibility);
            }
        }
    }
}

/// §4.10 `OverrideDeclaration`: replaces exactly one component of a used
/// package, identified by its stable key. The replacement itself (the
/// new declaration value) is applied by the caller through the ordinary
/// `CompiledStylesheet`/`Builder` machinery; this type only enforces the
/// override-specific invariants (XTSE3005) and marks the key as having
/// been overridden, so a later `finish` check can confirm every
/// `abstract` component was addressed (XTSE3010).
pub struct OverrideDeclaration {
    pub component_key: String,
}

impl OverrideDeclaration {
    /// Validate and record this override against `package`'s current
    /// component-visibility state. Must be called before the replacement
    /// value is installed, since it inspects the *original* component's
    /// effective visibility.
    pub fn apply<E, B>(&self, package: &CompiledPackage<E, B>) -> Result<(), PackageError> {
        let visibilities = package.component_visibilities();
        let current = visibilities
            .get(&self.component_key)
            .copied()
            .ok_or_else(|| PackageError::UnknownOverrideTarget {
                key: self.component_key.clone(),
            })?;
        if current == Visibility::Final {
            return Err(PackageError::OverrideOfFinal {
                key: self.component_key.clone(),
            });
        }
        Ok(())
    }
}

/// §4.10 "any remaining `abstract` component that is not overridden
/// fails **XTSE3010**". `overridden_keys` is every component key named
/// by an applied [`OverrideDeclaration`] in this `use-package`.
pub fn check_abstract_components_overridden<E, B>(
    package: &CompiledPackage<E, B>,
    overridden_keys: &[String],
) -> Result<(), PackageError> {
    for (key, visibility) in package.component_visibilities() {
        if visibility == Visibility::Abstract && !overridden_keys.contains(&key) {
            return Err(PackageError::UnimplementedAbstract { key });
        }
    }
    Ok(())
}

/// Whether a component with this effective visibility can still be
/// reached from outside the enclosing package after accept/override
/// processing — re-exposed here since `xsl:accept` is the mechanism
/// that changes this answer.
pub fn is_visible_outside_package(visibility: Visibility) -> bool {
    is_accessible(visibility)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarations::{TemplateRule, XsltVersion};
    use crate::stylesheet::Builder;
    use xslt_name::ExpandedName;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct FakeExpr;

    fn package_with_template(name: &str, visibility: Visibility) -> CompiledPackage<FakeExpr, &'static str> {
        let mut builder = Builder::<FakeExpr, &'static str>::new("file:///p.xsl", XsltVersion::V3_0);
        builder.add_template_rule(
            TemplateRule::new(
                None,
                Some(ExpandedName::unqualified(name)),
                None,
                0.0,
                0,
                0,
                vec![],
                "body",
                visibility,
            )
            .unwrap(),
        );
        CompiledPackage::new(builder.build().unwrap(), "file:///p.xsl", "1.0")
    }

    #[test]
    fn wildcard_pattern_matches_any_local_name() {
        let re = wildcard_regex("*:foo");
        assert!(re.is_match("*:foo"));
        let re = wildcard_regex("{urn:example}*");
        assert!(re.is_match("{urn:example}anything"));
        assert!(!re.is_match("{urn:other}anything"));
    }

    #[test]
    fn accept_hides_matching_templates() {
        let mut pkg = package_with_template("helper", Visibility::Public);
        let accept = AcceptDeclaration {
            component_type: ComponentType::Template,
            name_patterns: vec!["name:*".to_string()],
            visibility: Visibility::Hidden,
        };
        accept.apply(&mut pkg);
        let visibilities = pkg.component_visibilities();
        assert_eq!(visibilities["name:helper"], Visibility::Hidden);
        assert!(!is_visible_outside_package(visibilities["name:helper"]));
    }

    #[test]
    fn override_of_final_component_fails() {
        let pkg = package_with_template("locked", Visibility::Final);
        let over = OverrideDeclaration {
            component_key: "name:locked".to_string(),
        };
        let err = over.apply(&pkg).unwrap_err();
        assert!(matches!(err, PackageError::OverrideOfFinal { .. }));
    }

    #[test]
    fn unresolved_abstract_component_fails_finish_check() {
        let pkg = package_with_template("needs-impl", Visibility::Abstract);
        let err = check_abstract_components_overridden(&pkg, &[]).unwrap_err();
        assert!(matches!(err, PackageError::UnimplementedAbstract { .. }));
    }

    #[test]
    fn overridden_abstract_component_passes_finish_check() {
        let pkg = package_with_template("needs-impl", Visibility::Abstract);
        check_abstract_components_overridden(&pkg, &["name:needs-impl".to_string()]).unwrap();
    }
}
