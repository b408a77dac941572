//! Single-consume HTML cache and the attempted-set used for de-duplication.
//!
//! Both are plain associative containers; the single-threaded execution model
//! makes them safe without locking, but the remove-on-read / remove-on-failure
//! semantics keep interleaved schedule/consume operations individually
//! idempotent.

use std::collections::{HashMap, HashSet};

/// Absolute URL → raw HTML text, consumed exactly once.
///
/// Reading an entry removes it, so a later non-prefetched visit can never be
/// served stale content.
#[derive(Debug, Default)]
pub(crate) struct PrefetchCache {
    entries: HashMap<String, String>,
}

impl PrefetchCache {
    pub(crate) fn insert(&mut self, url: String, html: String) {
        self.entries.insert(url, html);
    }

    /// Pop semantics: returns and deletes the entry.
    pub(crate) fn take(&mut self, url: &str) -> Option<String> {
        self.entries.remove(url)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// URLs currently being or already prefetched.
///
/// An entry is removed on fetch failure so a later attempt can retry, and on
/// cache consumption so a consumed page is immediately eligible for a fresh
/// prefetch.
#[derive(Debug, Default)]
pub(crate) struct AttemptedSet {
    urls: HashSet<String>,
}

impl AttemptedSet {
    /// Returns `false` when the URL was already marked.
    pub(crate) fn mark(&mut self, url: &str) -> bool {
        self.urls.insert(url.to_owned())
    }

    pub(crate) fn unmark(&mut self, url: &str) {
        self.urls.remove(url);
    }

    pub(crate) fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_is_single_consume() {
        let mut cache = PrefetchCache::default();
        cache.insert("https://x.test/a".to_owned(), "<html></html>".to_owned());

        assert_eq!(cache.take("https://x.test/a").as_deref(), Some("<html></html>"));
        assert_eq!(cache.take("https://x.test/a"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_cache_take_unknown_url() {
        let mut cache = PrefetchCache::default();
        assert_eq!(cache.take("https://x.test/missing"), None);
    }

    #[test]
    fn test_reinsert_after_consume() {
        let mut cache = PrefetchCache::default();
        cache.insert("https://x.test/a".to_owned(), "v1".to_owned());
        assert_eq!(cache.take("https://x.test/a").as_deref(), Some("v1"));

        cache.insert("https://x.test/a".to_owned(), "v2".to_owned());
        assert_eq!(cache.take("https://x.test/a").as_deref(), Some("v2"));
    }

    #[test]
    fn test_attempted_set_dedup_and_retry() {
        let mut attempted = AttemptedSet::default();

        assert!(attempted.mark("https://x.test/a"));
        assert!(!attempted.mark("https://x.test/a"));
        assert!(attempted.contains("https://x.test/a"));

        // failure path: unmark re-enables the attempt
        attempted.unmark("https://x.test/a");
        assert!(!attempted.contains("https://x.test/a"));
        assert!(attempted.mark("https://x.test/a"));
    }
}
