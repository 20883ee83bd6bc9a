//! Error taxonomy for gateway calls and client-side form validation

use thiserror::Error;

/// Failure of a single gateway operation.
///
/// Every variant is terminal for the user action that triggered it; nothing
/// retries automatically.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Server rejected the request; `detail` message shown verbatim
    #[error("{0}")]
    Request(String),

    /// Credential rejected; the session must be re-established
    #[error("session expired, please sign in again")]
    Unauthorized,

    /// Transport-level failure, worth retrying manually
    #[error("network error: {0}")]
    Network(String),
}

/// Client-side validation failure. Blocks submission before any network call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please select a file to upload")]
    NoFile,

    #[error("only .docx and .pdf files are supported")]
    BadExtension,

    #[error("please select a genre")]
    NoGenre,

    /// Genre exists but is gated behind a higher tier
    #[error("'{0}' is not available on your current plan")]
    GenreNotAllowed(String),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}
