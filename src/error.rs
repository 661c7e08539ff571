use thiserror::Error;

/// Coarse failure classes surfaced to HTTP clients.
///
/// Every [`Error`] maps onto exactly one kind; the API layer turns the kind
/// into a status code and never exposes anything beyond the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Forbidden,
    RangeNotSatisfiable,
    UpstreamFailure,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("no SoundCloud client id could be obtained: {0}")]
    CredentialUnavailable(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Query must be at least 2 characters")]
    InvalidQuery,

    #[error("Invalid SoundCloud URL: {0}")]
    InvalidUrl(String),

    #[error("URL is not a valid {expected}")]
    WrongKind { expected: &'static str },

    #[error("No tracks found")]
    NoResults,

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("failed to resolve {url}: {reason}")]
    ResolutionFailed { url: String, reason: String },

    #[error("Track {0} is not streamable")]
    NotStreamable(u64),

    #[error("Track {id} download failed: {reason}")]
    DownloadFailed { id: u64, reason: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Requested range not satisfiable (file size {size})")]
    RangeNotSatisfiable { size: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_)
            | Error::InvalidQuery
            | Error::InvalidUrl(_)
            | Error::WrongKind { .. } => ErrorKind::InvalidInput,
            Error::NoResults | Error::NotFound(_) => ErrorKind::NotFound,
            Error::NotStreamable(_) => ErrorKind::Forbidden,
            Error::RangeNotSatisfiable { .. } => ErrorKind::RangeNotSatisfiable,
            Error::CredentialUnavailable(_)
            | Error::Upstream(_)
            | Error::ResolutionFailed { .. }
            | Error::DownloadFailed { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::Http(_) => ErrorKind::UpstreamFailure,
        }
    }

    pub(crate) fn download_failed(id: u64, reason: impl std::fmt::Display) -> Self {
        Error::DownloadFailed {
            id,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
