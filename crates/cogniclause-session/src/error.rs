use std::time::Duration;

use thiserror::Error;

/// Errors returned to the caller of a session operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Input rejected locally; no request was issued.
    #[error("{0}")]
    Validation(String),
}

/// Failure talking to the evaluation or upload service.
///
/// The `Display` output is what the session exposes as its failure message.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Network(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Failure reading or ending the current identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity service returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("identity request failed: {0}")]
    Network(String),
}

/// Failure listing history records.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("record store request failed: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}
