//! Error types for tarn-fetch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("content not found on any mirror")]
    NotFound,

    #[error("operation cancelled")]
    Cancelled,

    #[error("content exceeds the {limit} byte ceiling")]
    SizeExceeded { limit: u64 },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;

impl FetchError {
    /// True for the one error class that [`FetchOpts::allow_not_found`]
    /// is allowed to suppress.
    ///
    /// [`FetchOpts::allow_not_found`]: crate::FetchOpts::allow_not_found
    pub fn is_not_found(&self) -> bool { matches!(self, FetchError::NotFound) }
}
