use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The popped end of the queue holds no item.
    #[error("no key found")]
    NotFound,
    #[error("store error: {0}")]
    Sled(#[from] sled::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt data: {0}")]
    Corrupt(&'static str),
    #[error("queue index overflow")]
    IndexOverflow,
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
