//! Error types for reelsearch operations.

use thiserror::Error;

/// Result type alias using reelsearch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while bootstrapping or querying the movie store.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// The vector store could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// Collection creation was rejected by the store.
    #[error("schema error: {0}")]
    Schema(String),

    /// The named collection does not exist.
    #[error("collection not found: {0}")]
    NotFound(String),

    /// The dataset could not be loaded or a row failed validation.
    #[error("import error: {0}")]
    Import(String),

    /// The store answered with an unexpected status.
    #[error("store returned {status}: {message}")]
    Store { status: u16, message: String },

    /// The store answered with a payload we could not decode.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::Connection(err.to_string())
        } else if err.is_decode() {
            Error::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Error::Store {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Error::Connection(err.to_string())
        }
    }
}
