//! Error types for the CMS client

use thiserror::Error;

/// Errors returned while talking to the content repository
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The repository answered with a non-success status
    #[error("{url} returned {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// The body was not the expected JSON shape
    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The API root listed no master ref
    #[error("repository has no master ref")]
    NoMasterRef,

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
