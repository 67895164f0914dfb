//! Persisted boundary counters.
//!
//! Each end of the queue owns one counter, stored under a reserved key and
//! cached in memory behind its own mutex. The cached value only changes after
//! the store has accepted the new value, so a poisoned mutex still holds a
//! value that matches the store.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::key::encode_index;
use crate::store::{Store, WriteBatch};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Increment,
    Decrement,
}

impl Step {
    pub(crate) fn apply(self, value: i64) -> Result<i64> {
        match self {
            Step::Increment => value.checked_add(1),
            Step::Decrement => value.checked_sub(1),
        }
        .ok_or(Error::IndexOverflow)
    }
}

pub(crate) struct Boundary {
    key: &'static [u8],
    value: Mutex<i64>,
}

impl Boundary {
    /// Reads the counter stored under `key`, persisting `initial` when the
    /// key is absent.
    pub(crate) fn load<S: Store>(store: &S, key: &'static [u8], initial: i64) -> Result<Self> {
        let value = match store.get(key)? {
            Some(bytes) => crate::key::decode_index(&bytes)?,
            None => {
                store.put(key, &encode_index(initial))?;
                initial
            }
        };
        Ok(Self {
            key,
            value: Mutex::new(value),
        })
    }

    pub(crate) fn lock(&self) -> BoundaryGuard<'_> {
        BoundaryGuard {
            key: self.key,
            value: self.value.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Exclusive access to one counter for the duration of a queue operation.
pub(crate) struct BoundaryGuard<'a> {
    key: &'static [u8],
    value: MutexGuard<'a, i64>,
}

impl BoundaryGuard<'_> {
    pub(crate) fn get(&self) -> i64 {
        *self.value
    }

    /// Moves the counter and persists it on its own. On a store failure the
    /// cached value is restored and the error returned unchanged.
    pub(crate) fn step<S: Store>(&mut self, store: &S, step: Step) -> Result<i64> {
        let prior = *self.value;
        let next = step.apply(prior)?;
        *self.value = next;
        if let Err(err) = store.put(self.key, &encode_index(next)) {
            *self.value = prior;
            return Err(err);
        }
        Ok(next)
    }

    /// Adds the moved counter to `batch` without touching the cached value.
    /// Call [`commit`](Self::commit) once the batch has been applied.
    pub(crate) fn stage(&self, step: Step, batch: &mut WriteBatch) -> Result<i64> {
        let next = step.apply(*self.value)?;
        batch.put(self.key, &encode_index(next));
        Ok(next)
    }

    pub(crate) fn commit(&mut self, next: i64) {
        *self.value = next;
    }
}
