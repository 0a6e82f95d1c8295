use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Store Error: {0}")]
    StoreErr(#[from] crate::store::Error),
    #[error("Store Error: {0}")]
    Store(String),
}

/// A result type bound to the standard prefixstore error type.
pub type Result<T> = std::result::Result<T, Error>;
