//! Error types for the framing codec and the layers built on it.

use thiserror::Error;

/// Errors produced while encoding, decoding or transporting frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The outbound message could not be serialized to JSON.
    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The header block was unusable (missing or invalid `Content-Length`).
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// `Content-Length` exceeded the configured maximum.
    #[error("Content-Length {length} exceeds maximum {max}")]
    FrameTooLarge { length: usize, max: usize },

    /// A fully buffered body was not valid JSON.
    #[error("JSON parse error: {0}")]
    JsonParse(#[source] serde_json::Error),

    /// A decoded value is not a JSON-RPC request, notification or response.
    #[error("invalid JSON-RPC message: {0}")]
    InvalidMessage(String),

    /// A [`MessageFactory`](crate::lsp::MessageFactory) ran past `i64::MAX`.
    #[error("request ids exhausted")]
    IdsExhausted,

    /// The byte source ended in the middle of a frame.
    #[error("unexpected EOF with {buffered} bytes of an incomplete frame buffered")]
    UnexpectedEof { buffered: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Whether the stream that produced this error can keep being read.
    ///
    /// Decode errors leave the decoder resynchronized; I/O failures and EOF do not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FrameError::MalformedFrame(_)
                | FrameError::FrameTooLarge { .. }
                | FrameError::JsonParse(_)
                | FrameError::InvalidMessage(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
