//! Error types for the mime-streamer crate.

use std::io;
use thiserror::Error;

/// The main error type for the mime-streamer crate.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error from the underlying line source
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed multipart structure; parsing of the current stream cannot continue
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// The message has ended and there are no more parts
    #[error("No more parts in the MIME content")]
    NoPart,

    /// The unread remainder of a part could not be drained
    #[error("Failed to drain part content after {drained} bytes: {source}")]
    Drain {
        /// Bytes drained before the failure.
        drained: u64,
        /// The underlying read failure.
        #[source]
        source: io::Error,
    },

    /// Media type error
    #[error("Media type error: {0}")]
    MediaType(String),

    /// Boundary token that can never match a boundary line
    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    /// A multipart content type without a `boundary` parameter
    #[error("Missing boundary parameter in content type")]
    MissingBoundary,

    /// Content type is not `multipart/*`
    #[error("Not multipart content: {0}")]
    NotMultipart(String),

    /// Content type is not `multipart/related`
    #[error("Not multipart/related content: {0}")]
    NotMultipartRelated(String),

    /// Header block too large
    #[error("Message too large")]
    MessageTooLarge,
}

impl Error {
    pub(crate) fn parsing<S: Into<String>>(msg: S) -> Self {
        Error::Parsing(msg.into())
    }

    /// Returns `true` for the expected end-of-message signal.
    pub fn is_no_part(&self) -> bool {
        matches!(self, Error::NoPart)
    }
}

/// Specialized Result type for mime-streamer operations.
pub type Result<T> = std::result::Result<T, Error>;
