//! Generation-stamped memoization for derived game state.
//!
//! The game bumps a generation counter on every placement change. A cached
//! entry remembers the generation it was computed at and is recomputed on
//! the first read after a mismatch, so invalidation never needs a sweep.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Monotonic mutation counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Advance to a fresh generation.
    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// A family of lazily computed values keyed by `K`.
#[derive(Debug, Clone)]
pub(crate) struct MemoMap<K, T> {
    slots: RefCell<HashMap<K, (Generation, Arc<T>)>>,
}

impl<K, T> Default for MemoMap<K, T> {
    fn default() -> Self {
        Self {
            slots: RefCell::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, T> MemoMap<K, T> {
    /// Return the value of `key` for `generation`, computing it if stale.
    pub(crate) fn get_or_compute(
        &self,
        key: K,
        generation: Generation,
        compute: impl FnOnce() -> T,
    ) -> Arc<T> {
        if let Some((cached_at, value)) = self.slots.borrow().get(&key) {
            if *cached_at == generation {
                return Arc::clone(value);
            }
        }
        let value = Arc::new(compute());
        self.slots
            .borrow_mut()
            .insert(key, (generation, Arc::clone(&value)));
        value
    }

    /// Drop every entry matching `pred`.
    pub(crate) fn evict(&mut self, mut pred: impl FnMut(&K) -> bool) {
        self.slots.get_mut().retain(|k, _| !pred(k));
    }
}
