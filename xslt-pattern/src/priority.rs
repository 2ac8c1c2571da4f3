//! Default-priority computation (§4.3 "Universal priority rules").

use crate::pattern::{Pattern, PatternVariant};

/// Computes a pattern's default priority from its variant. Called once
/// by [`Pattern::new`] and stored on the pattern rather than
/// recomputed per match.
pub(crate) fn default_priority<E: Clone>(variant: &PatternVariant<E>) -> f64 {
    match variant {
        PatternVariant::Root | PatternVariant::DocumentNode => -0.5,
        PatternVariant::NameTest {
            node_test,
            predicates,
        } => {
            if !predicates.is_empty() {
                0.5
            } else {
                node_test.default_priority()
            }
        }
        PatternVariant::Path(path) => {
            if path.steps.len() != 1 {
                0.5
            } else {
                let step = &path.steps[0];
                if !step.predicates.is_empty() {
                    0.5
                } else {
                    step.node_test.default_priority()
                }
            }
        }
        PatternVariant::Union(alts) => alts
            .iter()
            .map(|p| p.default_priority)
            .fold(f64::NEG_INFINITY, f64::max),
        PatternVariant::Intersect(left, right) | PatternVariant::Except(left, right) => {
            leftmost_path_priority(left).unwrap_or_else(|| leftmost_path_priority(right).unwrap_or(0.5))
        }
        // A bare `.[predicate]` always carries a top-level predicate.
        PatternVariant::Atomic { .. } => 0.5,
        PatternVariant::Id(rooted) => function_pattern_priority(&rooted.trailing),
        PatternVariant::ElementWithId(rooted) => function_pattern_priority(&rooted.trailing),
        PatternVariant::Key(rooted) => function_pattern_priority(&rooted.trailing),
        PatternVariant::Doc(rooted) => function_pattern_priority(&rooted.trailing),
        PatternVariant::Variable(rooted) => function_pattern_priority(&rooted.trailing),
    }
}

/// Function-call patterns (`id()`, `key()`, `doc()`, `$var`) default to
/// `0.5` per §4.3, same as any other pattern whose trailing step carries
/// a predicate or whose path has more than one step; a single
/// unpredicated trailing step still falls back to its own node-test
/// priority so e.g. `key('k', .)/foo` ranks like any other named test.
fn function_pattern_priority<E>(trailing: &[crate::step::PatternStep<E>]) -> f64 {
    match trailing {
        [] => 0.5,
        [step] if step.predicates.is_empty() => step.node_test.default_priority(),
        _ => 0.5,
    }
}

/// Drills through nested `Intersect`/`Except` on the left to find a
/// `Path`/`NameTest` pattern whose own priority can stand in for the
/// whole expression, mirroring how a single dominant step usually
/// characterizes the combined pattern's likely specificity.
fn leftmost_path_priority<E: Clone>(pattern: &Pattern<E>) -> Option<f64> {
    match &pattern.variant {
        PatternVariant::NameTest { .. } | PatternVariant::Path(_) => Some(pattern.default_priority),
        PatternVariant::Intersect(left, _) | PatternVariant::Except(left, _) => {
            leftmost_path_priority(left)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_test::NodeTest;
    use crate::step::{Axis, PatternStep};
    use xslt_name::ExpandedName;

    fn name_test(local: &str) -> NodeTest {
        NodeTest::Element {
            name: ExpandedName::unqualified(local),
            type_constraint: None,
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct E;

    #[test]
    fn bare_name_test_gets_zero() {
        let variant = PatternVariant::<E>::NameTest {
            node_test: name_test("foo"),
            predicates: vec![],
        };
        assert_eq!(default_priority(&variant), 0.0);
    }

    #[test]
    fn wildcard_gets_minus_half() {
        let variant = PatternVariant::<E>::NameTest {
            node_test: NodeTest::any_element(),
            predicates: vec![],
        };
        assert_eq!(default_priority(&variant), -0.5);
    }

    #[test]
    fn namespace_wildcard_gets_minus_quarter() {
        let variant = PatternVariant::<E>::NameTest {
            node_test: NodeTest::Element {
                name: ExpandedName::any_local("urn:x"),
                type_constraint: None,
            },
            predicates: vec![],
        };
        assert_eq!(default_priority(&variant), -0.25);
    }

    #[test]
    fn predicate_forces_half() {
        let variant = PatternVariant::<E>::NameTest {
            node_test: name_test("foo"),
            predicates: vec![E],
        };
        assert_eq!(default_priority(&variant), 0.5);
    }

    #[test]
    fn multi_step_path_always_half() {
        let path = crate::pattern::PathPattern {
            steps: vec![
                PatternStep::new(Axis::Child, name_test("a")),
                PatternStep::new(Axis::Child, name_test("b")),
            ],
            absolute: false,
        };
        assert_eq!(default_priority(&PatternVariant::Path(path)), 0.5);
    }

    #[test]
    fn union_takes_max_of_alternatives() {
        let low = Pattern::new(
            PatternVariant::NameTest {
                node_test: NodeTest::any_element(),
                predicates: vec![],
            },
            "*",
        );
        let high = Pattern::new(
            PatternVariant::NameTest {
                node_test: name_test("foo"),
                predicates: vec![],
            },
            "foo",
        );
        let variant = PatternVariant::Union(vec![low, high]);
        assert_eq!(default_priority(&variant), 0.0);
    }
}
