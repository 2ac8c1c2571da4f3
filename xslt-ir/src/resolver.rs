//! `StylesheetResolver` (§4.7): href/base resolution, circular-import
//! detection, and the precedence/declaration-index counters that span a
//! whole import graph.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use iri_string::types::{IriAbsoluteString, IriReferenceStr};

use crate::error::ResolverError;

/// Injected URI-resolver collaborator (§6 "URI resolution"): given an
/// already-resolved system id, returns its byte content. Resolving
/// `href` against `base` is this resolver's own job (`resolve_uri`
/// below); `SourceResolver` only ever sees the final system id.
pub trait SourceResolver {
    fn open(&self, system_id: &str) -> Result<Vec<u8>, ResolverError>;
}

/// Strip a fragment for comparison purposes (§4.7 "URI normalization for
/// comparison strips fragments").
fn normalize_uri(uri: &str) -> &str {
    uri.split('#').next().unwrap_or(uri)
}

/// Resolve `href` against `base` using standard relative-URI semantics.
/// An already-absolute `href` is returned unchanged.
pub fn resolve_uri(href: &str, base: &str) -> Result<String, ResolverError> {
    let to_error = |message: &str| ResolverError::Resolution {
        href: href.to_string(),
        base: base.to_string(),
        message: message.to_string(),
    };

    let href_ref: &IriReferenceStr = href
        .try_into()
        .map_err(|_| to_error("href is not a valid IRI reference"))?;

    let resolved = match href_ref.to_iri() {
        Ok(absolute) => absolute.to_string(),
        Err(relative) => {
            let base_abs: IriAbsoluteString = base
                .try_into()
                .map_err(|_| to_error("base is not an absolute IRI"))?;
            relative.resolve_against(&base_abs).to_string()
        }
    };
    Ok(resolved)
}

/// Shared state threaded through every resolver spawned for one compile
/// (the root resolver and every resolver it hands to a child import or
/// include), per §4.7's "mutable loading set shared across child
/// resolvers" and §4.6's "strictly increasing integer counter spans the
/// entire import graph."
struct SharedState {
    loading: Mutex<HashSet<String>>,
    next_precedence: AtomicI64,
    next_declaration_index: AtomicU64,
}

/// RAII membership in the loading set: dropping it removes the entry,
/// matching §4.7's "entries are removed after the sub-compile finishes"
/// regardless of whether that sub-compile succeeded or failed.
pub struct LoadGuard {
    state: Arc<SharedState>,
    uri: String,
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        self.state.loading.lock().unwrap().remove(&self.uri);
    }
}

pub struct StylesheetResolver<R> {
    source_resolver: Arc<R>,
    state: Arc<SharedState>,
}

// Manual `Clone` (rather than `#[derive(Clone)]`) since the cloned
// handles are `Arc`s: cloning a resolver must not require `R: Clone`.
impl<R> Clone for StylesheetResolver<R> {
    fn clone(&self) -> Self {
        Self {
            source_resolver: self.source_resolver.clone(),
            state: self.state.clone(),
        }
    }
}

impl<R: SourceResolver> StylesheetResolver<R> {
    pub fn new(source_resolver: R) -> Self {
        Self {
            source_resolver: Arc::new(source_resolver),
            state: Arc::new(SharedState {
                loading: Mutex::new(HashSet::new()),
                next_precedence: AtomicI64::new(0),
                next_declaration_index: AtomicU64::new(0),
            }),
        }
    }

    /// A resolver for a child import/include, sharing this resolver's
    /// loading set and counters (§4.7).
    pub fn child(&self) -> Self {
        self.clone()
    }

    /// Resolve `href` against `base`, then open the resolved system id
    /// through the injected [`SourceResolver`] (§6).
    pub fn load(&self, href: &str, base: &str) -> Result<(Vec<u8>, String), ResolverError> {
        let system_id = resolve_uri(href, base)?;
        let bytes = self.source_resolver.open(&system_id)?;
        Ok((bytes, system_id))
    }

    /// Enter the loading set for `system_id`, failing with
    /// [`ResolverError::CircularReference`] if it (normalized) is
    /// already being compiled by an ancestor in this import graph.
    /// Re-importing the same URI from two different, non-overlapping
    /// paths is valid and must not raise (§4.7).
    pub fn begin_load(&self, system_id: &str) -> Result<LoadGuard, ResolverError> {
        let normalized = normalize_uri(system_id).to_string();
        let mut loading = self.state.loading.lock().unwrap();
        if !loading.insert(normalized.clone()) {
            return Err(ResolverError::CircularReference { uri: normalized });
        }
        drop(loading);
        Ok(LoadGuard {
            state: self.state.clone(),
            uri: normalized,
        })
    }

    /// Next strictly-increasing precedence value, shared across the
    /// whole import graph (§4.6).
    pub fn next_precedence(&self) -> i64 {
        self.state.next_precedence.fetch_add(1, Ordering::SeqCst)
    }

    /// Next strictly-increasing declaration index, shared across the
    /// whole import graph (§4.6, §9 "Declaration index").
    pub fn next_declaration_index(&self) -> u64 {
        self.state
            .next_declaration_index
            .fetch_add(1, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptySource;

    impl SourceResolver for EmptySource {
        fn open(&self, _system_id: &str) -> Result<Vec<u8>, ResolverError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn normalize_strips_fragment() {
        assert_eq!(normalize_uri("file:///a.xsl#frag"), "file:///a.xsl");
        assert_eq!(normalize_uri("file:///a.xsl"), "file:///a.xsl");
    }

    #[test]
    fn relative_href_resolves_against_base() {
        let resolved = resolve_uri("b.xsl", "file:///dir/main.xsl").unwrap();
        assert_eq!(resolved, "file:///dir/b.xsl");
    }

    #[test]
    fn absolute_href_is_unchanged() {
        let resolved = resolve_uri("file:///other/b.xsl", "file:///dir/main.xsl").unwrap();
        assert_eq!(resolved, "file:///other/b.xsl");
    }

    #[test]
    fn precedence_and_declaration_index_increase_monotonically() {
        let resolver = StylesheetResolver::new(EmptySource);
        assert_eq!(resolver.next_precedence(), 0);
        assert_eq!(resolver.next_precedence(), 1);
        assert_eq!(resolver.next_declaration_index(), 0);
        assert_eq!(resolver.next_declaration_index(), 1);
        assert_eq!(resolver.next_precedence(), 2);
    }

    #[test]
    fn child_resolver_shares_counters_and_loading_set() {
        let resolver = StylesheetResolver::new(EmptySource);
        let child = resolver.child();
        assert_eq!(resolver.next_precedence(), 0);
        assert_eq!(child.next_precedence(), 1);

        let _guard = resolver.begin_load("file:///a.xsl").unwrap();
        let err = child.begin_load("file:///a.xsl#other-fragment").unwrap_err();
        assert!(matches!(err, ResolverError::CircularReference { .. }));
    }

    #[test]
    fn reentering_after_the_guard_drops_is_not_circular() {
        let resolver = StylesheetResolver::new(EmptySource);
        {
            let _guard = resolver.begin_load("file:///a.xsl").unwrap();
        }
        assert!(resolver.begin_load("file:///a.xsl").is_ok());
    }

    #[test]
    fn reimporting_the_same_uri_from_two_live_paths_is_not_circular() {
        // Two imports of the same stylesheet that are NOT nested inside
        // one another (both loads complete before the next starts) must
        // succeed, each getting its own precedence.
        let resolver = StylesheetResolver::new(EmptySource);
        {
            let _first = resolver.begin_load("file:///shared.xsl").unwrap();
        }
        let _second = resolver.begin_load("file:///shared.xsl").unwrap();
    }
}
