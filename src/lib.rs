//! Persistent double-ended queue backed by an embedded key-value store.
//!
//! Items are pushed and popped at either end; the item bytes and both queue
//! boundaries live in the store, so a queue reopened at the same path picks
//! up exactly where it left off.

mod boundary;
pub mod config;
pub mod error;
pub mod key;
pub mod queue;
pub mod store;

pub use config::{QueueConfig, WriteMode};
pub use error::{Error, Result};
pub use queue::Queue;
pub use store::{MemoryStore, SledStore, Store, WriteBatch, WriteOp};
