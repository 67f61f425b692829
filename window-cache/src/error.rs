use alloc::string::String;

/// A failed page fetch.
///
/// Both variants are retryable: the cache releases the range and a later `request` covering it
/// issues a fresh fetch. The cache never retries on its own.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Network-level failure, no server response.
    #[error("transport error: {0}")]
    Transport(String),
    /// 5xx or application-reported failure.
    #[error("server error: {0}")]
    Server(String),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Server(_) => true,
        }
    }
}

/// A failed parent lookup during an ancestor walk.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The node (or its parent) no longer exists, e.g. it was deleted concurrently.
    #[error("node not found: {0}")]
    NotFound(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// A rejected relation mutation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// Rejected by business rules. Retrying the same request will fail again.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Server(String),
}

impl MutationError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Server(_))
    }
}
