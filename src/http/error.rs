//! Protocol error taxonomy.
//!
//! Every failure the request parser can produce is one variant of
//! [`ParseError`]. The connection loop never inspects error strings; it asks
//! the error for its [`status`](ParseError::status) instead.

use crate::http::response::StatusCode;
use crate::http::uri::UriError;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed request line")]
    MalformedRequestLine,

    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("invalid request target: {0}")]
    InvalidRequestTarget(#[from] UriError),

    #[error("unsupported http version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("duplicate header: {0}")]
    DuplicateHeader(String),

    #[error("header section too large")]
    HeadersTooLarge,

    #[error("missing host header")]
    MissingHostHeader,

    #[error("unsupported transfer encoding: {0}")]
    UnsupportedTransferEncoding(String),

    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(String),

    #[error("invalid chunk")]
    InvalidChunk,

    #[error("invalid content length: {0}")]
    InvalidContentLength(String),

    #[error("content length maximum exceeded")]
    ContentLengthExceeded,

    #[error("duplicate header in trailer: {0}")]
    DuplicateTrailerHeader(String),

    #[error("timeout reached")]
    TimeoutReached,

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl ParseError {
    /// Status code sent back to the client for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::ContentLengthExceeded => StatusCode::PayloadTooLarge,
            ParseError::InvalidRequestTarget(UriError::TooLong) => StatusCode::UriTooLong,
            ParseError::UnsupportedMethod(_) | ParseError::UnsupportedTransferEncoding(_) => {
                StatusCode::NotImplemented
            }
            ParseError::TimeoutReached => StatusCode::RequestTimeout,
            ParseError::HeadersTooLarge => StatusCode::RequestHeaderFieldsTooLarge,
            _ => StatusCode::BadRequest,
        }
    }

    /// Timeouts carry no usable request context and are kept out of the
    /// access log.
    pub fn is_access_logged(&self) -> bool {
        !matches!(self, ParseError::TimeoutReached | ParseError::ConnectionClosed)
    }
}
