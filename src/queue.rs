//! Double-ended queue over a key-value store.
//!
//! # Layout
//!
//! ```text
//! "low"        -> varint(low)
//! "high"       -> varint(high)
//! 'i' varint(i) -> item bytes, for low <= i <= high
//! ```
//!
//! A fresh queue has `low = 1, high = 0`; it is empty whenever
//! `high == low - 1`. Pushing at the back raises `high`, pushing at the front
//! lowers `low`, and pops move the counters back toward each other.
//!
//! # Locking
//!
//! `low` and `high` have independent mutexes, so pushes at opposite ends run
//! in parallel. Pops and [`Queue::len`] take both, always `low` first, so a
//! pop also blocks pushes at the other end until it finishes.
//!
//! # Durability
//!
//! With `sync_writes`, every mutation is followed by a store flush. Once the
//! mutation itself is applied the operation succeeds even if that flush
//! fails; the failure is logged and the background flusher or the next
//! [`Queue::flush`] retries it.

use std::path::Path;

use log::{debug, trace, warn};

use crate::boundary::{Boundary, Step};
use crate::config::{QueueConfig, WriteMode};
use crate::key::{item_key, HIGH_KEY, LOW_KEY};
use crate::store::{SledStore, Store, WriteBatch};
use crate::{Error, Result};

const INITIAL_LOW: i64 = 1;
const INITIAL_HIGH: i64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Front,
    Back,
}

impl End {
    fn push_step(self) -> Step {
        match self {
            End::Front => Step::Decrement,
            End::Back => Step::Increment,
        }
    }

    fn pop_step(self) -> Step {
        match self {
            End::Front => Step::Increment,
            End::Back => Step::Decrement,
        }
    }

    fn name(self) -> &'static str {
        match self {
            End::Front => "front",
            End::Back => "back",
        }
    }
}

/// Persistent double-ended queue.
///
/// Safe to share between threads; wrap it in an `Arc` to do so.
///
/// # Example
///
/// ```no_run
/// use levelqueue::Queue;
///
/// let queue = Queue::open("./jobs")?;
/// queue.rpush(b"first")?;
/// queue.rpush(b"second")?;
/// assert_eq!(queue.lpop()?, b"first");
/// queue.close()?;
/// # Ok::<(), levelqueue::Error>(())
/// ```
pub struct Queue<S: Store = SledStore> {
    store: S,
    config: QueueConfig,
    low: Boundary,
    high: Boundary,
}

impl Queue<SledStore> {
    /// Opens or creates a queue in the directory at `path`.
    ///
    /// # Errors
    ///
    /// - `Error::Io`: Failed to create the directory
    /// - `Error::Sled`: The store could not be opened
    /// - `Error::Corrupt`: A persisted boundary value failed to decode
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, QueueConfig::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: QueueConfig) -> Result<Self> {
        let store = SledStore::open(path, &config)?;
        Self::with_store(store, config)
    }
}

impl<S: Store> Queue<S> {
    /// Builds a queue on an already opened store, recovering the boundaries
    /// it holds or initialising them on first use.
    pub fn with_store(store: S, config: QueueConfig) -> Result<Self> {
        let low = Boundary::load(&store, LOW_KEY, INITIAL_LOW)?;
        let high = Boundary::load(&store, HIGH_KEY, INITIAL_HIGH)?;
        let queue = Self {
            store,
            config,
            low,
            high,
        };
        let (low, high) = queue.bounds();
        debug!(
            "queue ready: low={low} high={high} mode={:?}",
            queue.config.write_mode
        );
        Ok(queue)
    }

    /// Appends `data` at the back.
    pub fn rpush(&self, data: &[u8]) -> Result<()> {
        self.push(End::Back, data)
    }

    /// Prepends `data` at the front.
    pub fn lpush(&self, data: &[u8]) -> Result<()> {
        self.push(End::Front, data)
    }

    /// Removes and returns the item at the back.
    ///
    /// Returns `Error::NotFound` when the queue is empty.
    pub fn rpop(&self) -> Result<Vec<u8>> {
        self.pop(End::Back)
    }

    /// Removes and returns the item at the front.
    ///
    /// Returns `Error::NotFound` when the queue is empty.
    pub fn lpop(&self) -> Result<Vec<u8>> {
        self.pop(End::Front)
    }

    /// Number of items between the boundaries at the time of the call.
    pub fn len(&self) -> u64 {
        let (low, high) = self.bounds();
        let len = i128::from(high) - i128::from(low) + 1;
        u64::try_from(len.max(0)).unwrap_or(u64::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of `(low, high)`.
    pub fn bounds(&self) -> (i64, i64) {
        let low = self.low.lock();
        let high = self.high.lock();
        (low.get(), high.get())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    /// Flushes the store and releases it.
    pub fn close(self) -> Result<()> {
        self.store.flush()?;
        debug!("queue closed");
        Ok(())
    }

    fn push(&self, end: End, data: &[u8]) -> Result<()> {
        let boundary = match end {
            End::Front => &self.low,
            End::Back => &self.high,
        };
        let mut guard = boundary.lock();
        let index = match self.config.write_mode {
            WriteMode::Atomic => {
                let mut batch = WriteBatch::new();
                let next = guard.stage(end.push_step(), &mut batch)?;
                batch.put(&item_key(next), data);
                self.store.write_batch(batch)?;
                guard.commit(next);
                next
            }
            WriteMode::TwoStep => {
                let next = guard.step(&self.store, end.push_step())?;
                self.store.put(&item_key(next), data)?;
                next
            }
        };
        self.sync(end, index);
        trace!("push {} index={index} len={}", end.name(), data.len());
        Ok(())
    }

    fn pop(&self, end: End) -> Result<Vec<u8>> {
        let mut low = self.low.lock();
        let mut high = self.high.lock();
        if high.get() < low.get() {
            return Err(Error::NotFound);
        }
        let guard = match end {
            End::Front => &mut low,
            End::Back => &mut high,
        };

        let index = guard.get();
        let key = item_key(index);
        let data = match self.store.get(&key)? {
            Some(data) => data,
            None => {
                warn!("no item stored at {} index {index}", end.name());
                return Err(Error::NotFound);
            }
        };

        match self.config.write_mode {
            WriteMode::Atomic => {
                let mut batch = WriteBatch::new();
                let next = guard.stage(end.pop_step(), &mut batch)?;
                batch.delete(&key);
                self.store.write_batch(batch)?;
                guard.commit(next);
            }
            WriteMode::TwoStep => {
                guard.step(&self.store, end.pop_step())?;
                self.store.delete(&key)?;
            }
        }
        self.sync(end, index);
        trace!("pop {} index={index} len={}", end.name(), data.len());
        Ok(data)
    }

    /// Flushes after an applied mutation. The mutation cannot be undone at
    /// this point, so a failure is reported in the log rather than returned.
    fn sync(&self, end: End, index: i64) {
        if !self.config.sync_writes {
            return;
        }
        if let Err(err) = self.store.flush() {
            warn!(
                "flush after {} mutation at index {index} failed: {err}",
                end.name()
            );
        }
    }
}
