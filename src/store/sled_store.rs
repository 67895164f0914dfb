use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::{Store, WriteBatch, WriteOp};
use crate::config::QueueConfig;
use crate::Result;

/// How long `open` keeps retrying while another handle still holds the lock.
const LOCK_WAIT_TIMEOUT: Duration = Duration::from_secs(10);
const LOCK_BACKOFF_START: Duration = Duration::from_millis(2);
const LOCK_BACKOFF_MAX: Duration = Duration::from_millis(100);

/// On-disk store backed by a `sled` database directory.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Opens the database directory at `path`, creating it if needed.
    ///
    /// A handle dropped moments ago may still hold the directory lock while
    /// sled's background threads wind down, so lock contention is retried
    /// with backoff for up to `LOCK_WAIT_TIMEOUT`.
    pub fn open(path: impl AsRef<Path>, config: &QueueConfig) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let mode = if config.high_throughput {
            sled::Mode::HighThroughput
        } else {
            sled::Mode::LowSpace
        };
        let sled_config = sled::Config::new()
            .path(path)
            .cache_capacity(config.cache_capacity)
            .flush_every_ms(config.flush_every_ms)
            .mode(mode);

        let deadline = Instant::now() + LOCK_WAIT_TIMEOUT;
        let mut backoff = LOCK_BACKOFF_START;
        let mut attempts = 1u32;
        let db = loop {
            match sled_config.open() {
                Ok(db) => break db,
                Err(err) if is_lock_contention(&err) && Instant::now() < deadline => {
                    thread::sleep(backoff);
                    backoff = (backoff * 2).min(LOCK_BACKOFF_MAX);
                    attempts += 1;
                }
                Err(err) => {
                    if is_lock_contention(&err) {
                        warn!(
                            "gave up waiting for lock on {} after {attempts} attempts",
                            path.display()
                        );
                    }
                    return Err(err.into());
                }
            }
        };
        debug!(
            "opened sled store at {} (recovered: {}, attempts: {attempts})",
            path.display(),
            db.was_recovered()
        );
        Ok(Self { db })
    }
}

/// sled wraps the failed `flock` in an `ErrorKind::Other` error whose message
/// carries the original cause, so the text is checked as well as the kind.
fn is_lock_contention(err: &sled::Error) -> bool {
    match err {
        sled::Error::Io(io) => {
            io.kind() == std::io::ErrorKind::WouldBlock
                || io.to_string().contains("could not acquire lock")
        }
        _ => false,
    }
}

impl Store for SledStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|value| value.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db.insert(key, value)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.db.remove(key)?;
        Ok(())
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut sled_batch = sled::Batch::default();
        for op in batch.into_ops() {
            match op {
                WriteOp::Put { key, value } => sled_batch.insert(key, value),
                WriteOp::Delete { key } => sled_batch.remove(key),
            }
        }
        self.db.apply_batch(sled_batch)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}
