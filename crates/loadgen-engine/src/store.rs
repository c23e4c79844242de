//! Randomly addressable slot stores for per-cafe auxiliary state.

use rand::Rng;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Growable store whose reads and overwrites hit a uniformly random slot.
#[derive(Debug, Clone)]
pub struct PrivateObjectStore<T> {
    slots: Vec<T>,
}

impl<T> Default for PrivateObjectStore<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T: Clone> PrivateObjectStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value`, or overwrite a random slot when `replace` is set and
    /// the store is not empty.
    pub fn set<R: Rng + ?Sized>(&mut self, rng: &mut R, value: T, replace: bool) {
        if !replace || self.slots.is_empty() {
            self.slots.push(value);
        } else {
            let index = rng.gen_range(0..self.slots.len());
            self.slots[index] = value;
        }
    }

    /// Value of a random slot, or `None` when empty.
    pub fn get<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<T> {
        if self.slots.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.slots.len());
        Some(self.slots[index].clone())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// [`PrivateObjectStore`] behind a mutex; each call holds the lock once.
#[derive(Debug, Default)]
pub struct SyncObjectStore<T> {
    inner: Mutex<PrivateObjectStore<T>>,
}

impl<T: Clone> SyncObjectStore<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PrivateObjectStore::new()),
        }
    }

    pub fn set<R: Rng + ?Sized>(&self, rng: &mut R, value: T, replace: bool) {
        self.lock().set(rng, value, replace);
    }

    /// Append until the store holds `capacity` values, then overwrite.
    pub fn set_bounded<R: Rng + ?Sized>(&self, rng: &mut R, value: T, capacity: usize) {
        let mut store = self.lock();
        let replace = store.len() >= capacity;
        store.set(rng, value, replace);
    }

    pub fn get<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<T> {
        self.lock().get(rng)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, PrivateObjectStore<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
