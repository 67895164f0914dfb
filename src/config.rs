//! Queue configuration.

use serde::{Deserialize, Serialize};

/// Default sled page cache: 64 MB
const DEFAULT_CACHE_CAPACITY: u64 = 64 * 1024 * 1024;
/// Default background flush interval: 500 ms
const DEFAULT_FLUSH_EVERY_MS: u64 = 500;

/// How a boundary step and its paired item mutation reach the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
    /// Counter and item are written in one atomic batch.
    #[default]
    Atomic,
    /// Counter first, then the item, as separate store calls. A failure
    /// between the two leaves a phantom slot (push) or a leaked slot (pop).
    TwoStep,
}

/// Configuration for a queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// How counter and item mutations are grouped.
    /// Default: `WriteMode::Atomic`
    #[serde(default)]
    pub write_mode: WriteMode,

    /// Flush the store to disk after every push and pop.
    /// Default: false (rely on the background flusher)
    pub sync_writes: bool,

    /// Page cache size for the on-disk store, in bytes.
    /// Default: 64 MB
    pub cache_capacity: u64,

    /// Background flush interval in milliseconds; `None` disables it.
    /// Default: 500
    pub flush_every_ms: Option<u64>,

    /// Favour write throughput over disk footprint.
    /// Default: false
    pub high_throughput: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            write_mode: WriteMode::Atomic,
            sync_writes: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            flush_every_ms: Some(DEFAULT_FLUSH_EVERY_MS),
            high_throughput: false,
        }
    }
}

impl QueueConfig {
    /// Every mutation is on disk before the call returns.
    pub fn durable() -> Self {
        Self {
            sync_writes: true,
            ..Self::default()
        }
    }

    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }
}
