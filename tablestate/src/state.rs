//! Reactive primitives used by the table engine.
//!
//! Three pieces cooperate:
//!
//! - [`State<T>`] is a caller-owned, shared value. Every write bumps a
//!   revision counter that the engine watches.
//! - [`Tracked<T>`] is an engine-owned slot with its own revision.
//! - [`Memo<T>`] caches a derived value together with the revisions of the
//!   inputs it was computed from, and recomputes only when one of them moved.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Reactive state wrapper with interior mutability.
///
/// `State<T>` is cheap to clone; clones share the same value and revision.
/// Hand a clone to the table and keep one to push new columns or rows.
///
/// # Example
///
/// ```
/// use tablestate::state::State;
///
/// let rows = State::new(vec![1, 2, 3]);
/// let before = rows.revision();
/// rows.update(|r| r.push(4));
/// assert!(rows.revision() > before);
/// assert_eq!(rows.get().len(), 4);
/// ```
#[derive(Debug)]
pub struct State<T> {
    inner: Arc<RwLock<T>>,
    revision: Arc<AtomicU64>,
}

impl<T> State<T> {
    /// Create a new state with the given value
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
            revision: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Get a clone of the current value
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Read the current value without cloning it.
    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        match self.inner.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    /// Set a new value
    pub fn set(&self, value: T) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = value;
            self.revision.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Update the value using a closure
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        if let Ok(mut guard) = self.inner.write() {
            f(&mut guard);
            self.revision.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Monotonic counter bumped by every write.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            revision: Arc::clone(&self.revision),
        }
    }
}

impl<T: Default> Default for State<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Engine-owned value with change tracking.
#[derive(Debug, Clone, Default)]
pub struct Tracked<T> {
    value: T,
    revision: u64,
}

impl<T: PartialEq> Tracked<T> {
    pub fn new(value: T) -> Self {
        Self { value, revision: 0 }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the value. Returns `true` (and bumps the revision) only when
    /// the new value differs from the old one.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.revision += 1;
        true
    }

    /// Mutate in place. The revision moves only if the value changed.
    pub fn update(&mut self, f: impl FnOnce(&mut T)) -> bool
    where
        T: Clone,
    {
        let mut next = self.value.clone();
        f(&mut next);
        self.set(next)
    }
}

/// A derived value cached by dependency revisions.
#[derive(Debug)]
pub struct Memo<T> {
    deps: Vec<u64>,
    value: Option<Arc<T>>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self {
            deps: Vec::new(),
            value: None,
        }
    }
}

impl<T> Memo<T> {
    /// Return the cached value if `deps` match the ones it was computed from,
    /// otherwise recompute it with `compute`.
    pub fn get_or_compute(&mut self, deps: &[u64], compute: impl FnOnce() -> T) -> Arc<T> {
        if let Some(value) = &self.value
            && self.deps == deps
        {
            return Arc::clone(value);
        }
        let value = Arc::new(compute());
        self.deps = deps.to_vec();
        self.value = Some(Arc::clone(&value));
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_clones_share_revision() {
        let a = State::new(String::from("x"));
        let b = a.clone();
        b.set("y".into());
        assert_eq!(a.get(), "y");
        assert_eq!(a.revision(), 1);
    }

    #[test]
    fn test_tracked_ignores_equal_writes() {
        let mut slot = Tracked::new(vec![1, 2]);
        assert!(!slot.set(vec![1, 2]));
        assert_eq!(slot.revision(), 0);
        assert!(slot.update(|v| v.push(3)));
        assert_eq!(slot.revision(), 1);
    }

    #[test]
    fn test_memo_recomputes_on_dependency_change() {
        let mut memo = Memo::default();
        let mut calls = 0;
        memo.get_or_compute(&[1, 1], || {
            calls += 1;
            10
        });
        memo.get_or_compute(&[1, 1], || {
            calls += 1;
            10
        });
        assert_eq!(calls, 1);
        let value = memo.get_or_compute(&[1, 2], || {
            calls += 1;
            20
        });
        assert_eq!(calls, 2);
        assert_eq!(*value, 20);
    }
}
