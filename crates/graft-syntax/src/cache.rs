//! LRU cache for compiled pattern and template artefacts.
//!
//! Compilation parses text and walks the tree for markers; callers that
//! build the same pattern shape repeatedly (a rule engine iterating over
//! files, say) share one [`CompileCache`] across patterns and templates.
//! The cache is injected, never global: two engines with different
//! lifetimes keep independent caches.

use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::debug;

use crate::compile::Compiled;
use crate::error::GraftError;
use crate::language::Language;

const DEFAULT_CAPACITY: usize = 256;

/// Cache key: everything compilation output depends on.
///
/// The key is the canonical marker text plus the language and the prelude
/// lines from the match configuration. Capture constraints and kind
/// requirements are deliberately absent; they apply at match time and do
/// not change the compiled tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CompileKey {
    pub text: String,
    pub language: Language,
    pub context: Vec<String>,
    pub dependencies: Vec<String>,
}

/// A bounded, least-recently-used cache of compiled artefacts.
pub struct CompileCache {
    inner: RefCell<LruCache<CompileKey, Arc<Compiled>>>,
}

impl CompileCache {
    /// Creates a cache holding at most `capacity` compiled artefacts.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: RefCell::new(LruCache::new(capacity)),
        }
    }

    /// Creates a cache with the default capacity of 256 entries.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::new(capacity)
    }

    /// Returns the number of cached artefacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Drops every cached artefact.
    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }

    /// Returns the cached artefact for `key`, compiling on a miss.
    ///
    /// Compilation failures are returned to the caller and never cached;
    /// a later attempt with a corrected configuration starts fresh.
    pub(crate) fn get_or_compile<F>(
        &self,
        key: CompileKey,
        build: F,
    ) -> Result<Arc<Compiled>, GraftError>
    where
        F: FnOnce() -> Result<Compiled, GraftError>,
    {
        if let Some(hit) = self.inner.borrow_mut().get(&key) {
            debug!(language = %key.language, "compile cache hit");
            return Ok(Arc::clone(hit));
        }

        debug!(language = %key.language, "compile cache miss");
        let compiled = Arc::new(build()?);
        self.inner
            .borrow_mut()
            .put(key, Arc::clone(&compiled));
        Ok(compiled)
    }
}

impl std::fmt::Debug for CompileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileCache")
            .field("len", &self.len())
            .finish()
    }
}

impl Default for CompileCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;
    use crate::template::Template;

    #[test]
    fn identical_shapes_share_one_entry() {
        let cache = CompileCache::with_default_capacity();

        // Same code with differently named slots compiles to the same tree.
        Pattern::compile_cached("foo($X)", Language::Rust, &cache).expect("compile");
        Pattern::compile_cached("foo($Y)", Language::Rust, &cache).expect("compile");
        assert_eq!(cache.len(), 1);

        Pattern::compile_cached("bar($X)", Language::Rust, &cache).expect("compile");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn patterns_and_templates_share_artefacts() {
        let cache = CompileCache::with_default_capacity();

        Pattern::compile_cached("foo($X)", Language::Rust, &cache).expect("compile");
        Template::compile_cached("foo($X)", Language::Rust, &cache).expect("compile");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn languages_do_not_collide() {
        let cache = CompileCache::with_default_capacity();

        Pattern::compile_cached("foo($X)", Language::Rust, &cache).expect("compile");
        Pattern::compile_cached("foo($X)", Language::Python, &cache).expect("compile");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn capacity_bounds_the_cache() {
        let cache = CompileCache::new(NonZeroUsize::MIN);

        Pattern::compile_cached("foo($X)", Language::Rust, &cache).expect("compile");
        Pattern::compile_cached("bar($X)", Language::Rust, &cache).expect("compile");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = CompileCache::with_default_capacity();
        Pattern::compile_cached("foo($X)", Language::Rust, &cache).expect("compile");

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = CompileCache::with_default_capacity();

        assert!(Pattern::compile_cached("fn ][ nope", Language::Rust, &cache).is_err());
        assert!(cache.is_empty());
    }
}
