/*
MIT License

Copyright (c) 2026 Raja Lehtihet and Wael El Oraiby

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Build engine and structural result cache.
//!
//! The cache is keyed by [`StructuralHash`] and stores both successful results
//! and backend failures, so structurally identical features share a single
//! backend invocation whatever its outcome.

use crate::backend::{BackendError, BuildRequest, BuildResult, GeometryBackend};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::StructuralHash;

/// Cached outcome of one backend invocation.
#[derive(Debug, Clone)]
pub enum CacheEntry {
    Built(Rc<BuildResult>),
    Failed(BackendError),
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<StructuralHash, CacheEntry>,
    hits: usize,
    misses: usize,
    backend_builds: usize,
}

/// Result cache handle.
///
/// Cloning the handle shares the underlying storage; this is how several
/// sessions opt into one cache (see `CacheScope::Shared`).
#[derive(Clone, Default)]
pub struct ResultCache {
    inner: Rc<RefCell<CacheInner>>,
}

/// Cache statistics for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Number of cached outcomes.
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
    /// Number of times the geometry backend was invoked.
    pub backend_builds: usize,
}

impl CacheStats {
    /// Returns the hit rate in `0.0..=1.0`, or `0.0` before any lookup.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl ResultCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an outcome, recording a hit or a miss.
    pub fn lookup(&self, hash: &StructuralHash) -> Option<CacheEntry> {
        let mut inner = self.inner.borrow_mut();
        let entry = inner.entries.get(hash).cloned();
        if entry.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        entry
    }

    /// Returns whether an outcome is stored, without touching statistics.
    pub fn contains(&self, hash: &StructuralHash) -> bool {
        self.inner.borrow().entries.contains_key(hash)
    }

    pub fn insert(&self, hash: StructuralHash, entry: CacheEntry) {
        self.inner.borrow_mut().entries.insert(hash, entry);
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.borrow();
        CacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
            backend_builds: inner.backend_builds,
        }
    }

    /// Drops every entry and resets counters.
    ///
    /// Features already built keep their results; only later lookups are
    /// affected.
    pub fn clear(&self) {
        *self.inner.borrow_mut() = CacheInner::default();
    }

    fn record_backend_build(&self) {
        self.inner.borrow_mut().backend_builds += 1;
    }
}

impl fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Backend plus cache pair driving feature builds.
pub struct BuildEngine {
    backend: Rc<dyn GeometryBackend>,
    cache: ResultCache,
    caching: bool,
}

impl BuildEngine {
    /// Creates an engine; `cache: None` disables result sharing.
    pub fn new(backend: Rc<dyn GeometryBackend>, cache: Option<ResultCache>) -> Self {
        let caching = cache.is_some();
        Self {
            backend,
            cache: cache.unwrap_or_default(),
            caching,
        }
    }

    pub fn backend(&self) -> &dyn GeometryBackend {
        self.backend.as_ref()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn caching(&self) -> bool {
        self.caching
    }

    pub(crate) fn lookup(&self, hash: &StructuralHash) -> Option<CacheEntry> {
        if !self.caching {
            return None;
        }
        self.cache.lookup(hash)
    }

    /// Invokes the backend and records the outcome under the request hash.
    pub(crate) fn invoke(&self, request: &BuildRequest<'_>) -> Result<Rc<BuildResult>, BackendError> {
        self.cache.record_backend_build();
        let outcome = self.backend.build(request).map(Rc::new);
        if self.caching {
            let entry = match &outcome {
                Ok(result) => CacheEntry::Built(Rc::clone(result)),
                Err(err) => CacheEntry::Failed(err.clone()),
            };
            self.cache.insert(request.hash, entry);
        }
        outcome
    }
}

impl fmt::Debug for BuildEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildEngine")
            .field("backend", &self.backend.name())
            .field("caching", &self.caching)
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::hash::HashBuilder;

    fn key(name: &str) -> StructuralHash {
        let mut builder = HashBuilder::new("test");
        builder.str(name);
        builder.finish()
    }

    #[test]
    fn hit_rate_counts_lookups() {
        let cache = ResultCache::new();
        assert_eq!(cache.stats().hit_rate(), 0.0);
        cache.insert(key("a"), CacheEntry::Failed(BackendError::Infeasible("x".into())));
        assert!(cache.lookup(&key("a")).is_some());
        assert!(cache.lookup(&key("a")).is_some());
        assert!(cache.lookup(&key("a")).is_some());
        assert!(cache.lookup(&key("b")).is_none());
        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert!((stats.hit_rate() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn clones_share_storage() {
        let cache = ResultCache::new();
        let other = cache.clone();
        other.insert(key("a"), CacheEntry::Failed(BackendError::Infeasible("x".into())));
        assert!(cache.contains(&key("a")));
        cache.clear();
        assert!(other.is_empty());
    }
}
