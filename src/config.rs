//! Streamer configuration.

use crate::error::Result;
use crate::grammar::validate_boundary;
use crate::header::{MAX_MIME_HEADERS, MAX_MIME_HEADER_SIZE};
use crate::line::DEFAULT_MAX_LINE_LENGTH;

/// How lines before the first boundary line are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeadingContent {
    /// While no boundary is known, leading lines are the header block of an
    /// envelope part, e.g. the top-level `Content-Type: multipart/related;
    /// boundary=...` of a message. Required for boundary discovery from
    /// headers. With a configured boundary they are dropped as preamble.
    #[default]
    Envelope,
    /// Leading lines are preamble and are dropped.
    Discard,
    /// Any non-boundary line before the first boundary is a parsing error.
    Reject,
}

/// How a stream that ends without a boundary is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Termination {
    /// A body with no following boundary runs to end of input, and end of
    /// input while looking for the next part ends the message.
    #[default]
    Lenient,
    /// Every body must be closed by a boundary line and the message by the
    /// end-of-message marker (boundary followed by a blank line or EOF).
    Strict,
}

/// Configuration for [`MimeStreamer`](crate::MimeStreamer).
///
/// # Examples
///
/// ```
/// use mime_streamer::{LeadingContent, StreamerConfig, Termination};
///
/// let config = StreamerConfig::new()
///     .with_boundary("MIME_boundary")
///     .unwrap()
///     .leading_content(LeadingContent::Discard)
///     .termination(Termination::Strict);
/// assert_eq!(config.boundary(), Some("MIME_boundary"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamerConfig {
    pub(crate) boundary: Option<String>,
    pub(crate) leading: LeadingContent,
    pub(crate) termination: Termination,
    pub(crate) max_line_length: usize,
    pub(crate) max_header_bytes: usize,
    pub(crate) max_headers: usize,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            boundary: None,
            leading: LeadingContent::default(),
            termination: Termination::default(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_header_bytes: MAX_MIME_HEADER_SIZE,
            max_headers: MAX_MIME_HEADERS,
        }
    }
}

impl StreamerConfig {
    /// Default configuration: boundary discovered from headers, envelope
    /// leading content, lenient termination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the boundary token. Any non-empty single-line token is accepted.
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Result<Self> {
        let boundary = boundary.into();
        validate_boundary(&boundary)?;
        self.boundary = Some(boundary);
        Ok(self)
    }

    /// Sets how lines before the first boundary are treated.
    pub fn leading_content(mut self, leading: LeadingContent) -> Self {
        self.leading = leading;
        self
    }

    /// Sets how a missing closing boundary is treated.
    pub fn termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    /// Sets the maximum length of one input line.
    pub fn max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }

    /// Sets the maximum size of one header block in bytes.
    pub fn max_header_bytes(mut self, max: usize) -> Self {
        self.max_header_bytes = max;
        self
    }

    /// Sets the maximum number of headers in one block.
    pub fn max_headers(mut self, max: usize) -> Self {
        self.max_headers = max;
        self
    }

    /// The configured boundary token, if any.
    pub fn boundary(&self) -> Option<&str> {
        self.boundary.as_deref()
    }

    /// The configured leading-content policy.
    pub fn leading(&self) -> LeadingContent {
        self.leading
    }

    /// The configured termination policy.
    pub fn termination_policy(&self) -> Termination {
        self.termination
    }
}
