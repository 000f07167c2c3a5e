use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the client library.
///
/// Nothing here is fatal to the application: validation and API errors are
/// local to the flow that triggered them, and network errors are surfaced
/// without automatic retry.
#[derive(Debug, Error)]
pub enum Error {
    /// Detected locally; the request never reached the network.
    #[error("{0}")]
    Validation(String),
    /// The server rejected the request with the contained reason.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// The request never completed.
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors the user caused locally, as opposed to server or
    /// transport failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
