use std::io;

use thiserror::Error;

/// Errors returned by the codec.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the input or writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The compressed stream does not describe a decodable file.
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    /// A value does not fit the fixed-width fields of the container.
    #[error("{what} exceeds the limit of {limit}")]
    CapacityExceeded { what: &'static str, limit: u64 },
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedHeader(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
