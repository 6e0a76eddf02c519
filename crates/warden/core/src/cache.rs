//! Per-actor decision cache
//!
//! Each actor owns at most one [`DecisionCache`]. Entries are keyed by the
//! query selector (action or policy label) and the subject's identity, and
//! live as long as the actor does. There is no eviction: a reload
//! overwrites the entry in place.

use crate::decision::Decision;
use crate::subject::Protectable;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Whether a query may answer from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Return a cached decision verbatim when present
    #[default]
    Cached,

    /// Re-evaluate and overwrite the cached decision
    Reload,
}

/// How the queried policy was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Resolved through the subject's action map
    Action,

    /// Resolved through the policy registry
    Policy,
}

/// Cache key: selector, action or label, and subject identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    selector: Selector,
    name: String,
    subject_type: TypeId,
    subject_id: String,
}

impl CacheKey {
    pub fn new(selector: Selector, name: impl Into<String>, subject: &dyn Protectable) -> Self {
        Self {
            selector,
            name: name.into(),
            subject_type: subject.concrete_type_id(),
            subject_id: subject.subject_id(),
        }
    }

    pub fn action(action: &str, subject: &dyn Protectable) -> Self {
        Self::new(Selector::Action, action, subject)
    }

    pub fn policy(label: &str, subject: &dyn Protectable) -> Self {
        Self::new(Selector::Policy, label, subject)
    }

    pub fn selector(&self) -> Selector {
        self.selector
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }
}

/// Memoized decisions of a single actor
#[derive(Debug, Default)]
pub struct DecisionCache {
    entries: Mutex<HashMap<CacheKey, Decision>>,
}

impl DecisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Decision> {
        self.entries().get(key).cloned()
    }

    pub fn store(&self, key: CacheKey, decision: Decision) {
        self.entries().insert(key, decision);
    }

    /// Drop one entry, returning whether it existed
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Answer from the cache or evaluate and store.
    ///
    /// The lock is not held while `evaluate` runs, so a policy may query
    /// the same actor. Errors are returned without touching the cache.
    pub fn fetch_or_evaluate<E, F>(&self, key: CacheKey, mode: CacheMode, evaluate: F) -> Result<Decision, E>
    where
        F: FnOnce() -> Result<Decision, E>,
    {
        if mode == CacheMode::Cached {
            if let Some(decision) = self.get(&key) {
                tracing::trace!(
                    selector = ?key.selector,
                    name = %key.name,
                    subject = %key.subject_id,
                    "Decision cache hit"
                );
                return Ok(decision);
            }
        }

        let decision = evaluate()?;
        self.store(key, decision.clone());
        Ok(decision)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, Decision>> {
        // Entries are plain values; a panic elsewhere cannot leave them torn.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug)]
    struct Song(&'static str);

    impl Protectable for Song {
        fn subject_id(&self) -> String {
            self.0.to_string()
        }
    }

    #[derive(Debug)]
    struct Album(&'static str);

    impl Protectable for Album {
        fn subject_id(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_cached_mode_evaluates_once() {
        let cache = DecisionCache::new();
        let calls = Cell::new(0);
        let song = Song("yesterday");

        for _ in 0..3 {
            let decision = cache
                .fetch_or_evaluate::<(), _>(CacheKey::action("sing", &song), CacheMode::Cached, || {
                    calls.set(calls.get() + 1);
                    Ok(Decision::allow())
                })
                .unwrap();
            assert!(decision.is_allowed());
        }

        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_reload_overwrites_entry() {
        let cache = DecisionCache::new();
        let song = Song("yesterday");
        let key = CacheKey::action("sing", &song);

        cache.store(key.clone(), Decision::allow());
        let decision = cache
            .fetch_or_evaluate::<(), _>(key.clone(), CacheMode::Reload, || Ok(Decision::deny()))
            .unwrap();

        assert!(decision.is_denied());
        assert_eq!(cache.get(&key), Some(Decision::deny()));
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = DecisionCache::new();
        let song = Song("yesterday");

        let result = cache.fetch_or_evaluate(CacheKey::action("sing", &song), CacheMode::Cached, || {
            Err("not declared")
        });

        assert_eq!(result, Err("not declared"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_keys_distinguish_selector_and_subject_type() {
        let song = Song("help");
        let album = Album("help");

        assert_ne!(CacheKey::action("read", &song), CacheKey::policy("read", &song));
        assert_ne!(CacheKey::action("read", &song), CacheKey::action("read", &album));
        assert_eq!(CacheKey::action("read", &song), CacheKey::action("read", &Song("help")));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = DecisionCache::new();
        let song = Song("help");
        let key = CacheKey::policy("author_policy", &song);

        cache.store(key.clone(), Decision::allow());
        assert!(cache.invalidate(&key));
        assert!(!cache.invalidate(&key));

        cache.store(key, Decision::allow());
        cache.clear();
        assert!(cache.is_empty());
    }
}
