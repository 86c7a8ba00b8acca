use thiserror::Error;

/// Every failure the core can report.  None of them is fatal: each one
/// degrades to a narrower state that the user can recover from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Transport failure, timeout, unexpected status or undecodable body.
    #[error("network error: {0}")]
    Network(String),

    /// The catalog has no detail for the requested show id.
    #[error("show not found: {0}")]
    NotFound(String),

    /// Writing to durable storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored blob could not be decoded.
    #[error("malformed stored data: {0}")]
    MalformedData(String),

    /// The episode is already in the favourites list.
    #[error("episode {0} is already a favourite")]
    DuplicateFavourite(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Network(format!("request timed out: {}", err))
        } else {
            Error::Network(err.to_string())
        }
    }
}
