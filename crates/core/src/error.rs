//! # Errors
//!
//! Failure taxonomy for a generation session. None of these escape the read
//! loop: the client converts each into a session update.

use thiserror::Error;

/// Errors that end a generation before the backend delivered a result
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The request was rejected before any network I/O
    #[error("invalid generation request: {0}")]
    InvalidRequest(String),
    /// Connecting or reading the response body failed
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
    /// The backend answered with a non-success status
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The body ended without a `done` or `error` envelope
    #[error("stream closed before the article was delivered")]
    StreamClosed,
}

/// A single frame that could not be decoded
///
/// Protocol errors are skipped; the session keeps going.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("frame is not a valid envelope: {0}")]
    Json(#[from] serde_json::Error),
    #[error("`event` envelope carries an invalid event: {0}")]
    Event(serde_json::Error),
}

pub type Result<T, E = GenerationError> = std::result::Result<T, E>;
