//! Boundary recognition and part segmentation.
//!
//! The engine walks the shared [`LineCursor`] from one part to the next:
//!
//! ```text
//! SeekingPart --boundary, lookahead not blank--> ReadingHeaders
//! SeekingPart --boundary, lookahead blank/EOF--> StreamEnded
//! ReadingHeaders --blank line--> BodyReady (or SeekingPart if the body is empty)
//! BodyReady --body drained--> SeekingPart
//! ```
//!
//! Between invocations the cursor is either at the first header line of an
//! unparsed part, inside a body that has not reached its boundary, or past
//! the end of the message. It is never left inside a boundary line.

use crate::config::{LeadingContent, StreamerConfig, Termination};
use crate::cursor::LineCursor;
use crate::error::{Error, Result};
use crate::header::HeaderMap;
use crate::line::Line;
use crate::media_type::multipart_boundary;
use bytes::Bytes;
use futures::Stream;
use std::io;
use tracing::debug;

const PREVIEW_LEN: usize = 76;

/// A boundary token and the `--token` prefix that marks a boundary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    token: String,
    dash_boundary: Bytes,
}

impl Boundary {
    /// Creates a boundary from its token (without the leading `--`).
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let dash_boundary = Bytes::from(format!("--{}", token));
        Self {
            token,
            dash_boundary,
        }
    }

    /// The boundary token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns `true` if `line` starts with `--` followed by the token.
    pub fn matches(&self, line: &[u8]) -> bool {
        line.starts_with(&self.dash_boundary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekingPart,
    ReadingHeaders,
    BodyReady,
    StreamEnded,
}

/// Headers of a newly started part, and whether a body follows them.
#[derive(Debug)]
pub(crate) struct PartStart {
    pub(crate) headers: HeaderMap,
    pub(crate) has_body: bool,
}

/// The part-boundary state machine.
#[derive(Debug)]
pub(crate) struct BoundaryEngine {
    boundary: Option<Boundary>,
    state: State,
    leading: LeadingContent,
    termination: Termination,
    max_header_bytes: usize,
    max_headers: usize,
    parts_produced: u64,
}

impl BoundaryEngine {
    pub(crate) fn new(config: &StreamerConfig) -> Self {
        Self {
            boundary: config.boundary.as_deref().map(Boundary::new),
            state: State::SeekingPart,
            leading: config.leading,
            termination: config.termination,
            max_header_bytes: config.max_header_bytes,
            max_headers: config.max_headers,
            parts_produced: 0,
        }
    }

    pub(crate) fn boundary(&self) -> Option<&Boundary> {
        self.boundary.as_ref()
    }

    pub(crate) fn termination(&self) -> Termination {
        self.termination
    }

    pub(crate) fn parts_produced(&self) -> u64 {
        self.parts_produced
    }

    pub(crate) fn is_ended(&self) -> bool {
        self.state == State::StreamEnded
    }

    /// Marks the current body as drained; the cursor is at a boundary or EOF.
    pub(crate) fn finish_body(&mut self) {
        if self.state == State::BodyReady {
            self.state = State::SeekingPart;
        }
    }

    fn is_boundary(&self, line: &Line) -> bool {
        self.boundary
            .as_ref()
            .map_or(false, |b| b.matches(line.content()))
    }

    /// Advances the cursor to the next part and parses its headers.
    ///
    /// Returns `Ok(None)` once the end-of-message marker has been seen. The
    /// previous part's body must already be drained.
    pub(crate) async fn next_part<S>(
        &mut self,
        cursor: &mut LineCursor<S>,
    ) -> Result<Option<PartStart>>
    where
        S: Stream<Item = io::Result<Line>> + Unpin,
    {
        match self.state {
            State::StreamEnded => return Ok(None),
            State::BodyReady => {
                return Err(Error::parsing("previous part body was not drained"));
            }
            State::SeekingPart | State::ReadingHeaders => {}
        }

        self.state = State::SeekingPart;
        if !self.seek_part(cursor).await? {
            self.state = State::StreamEnded;
            return Ok(None);
        }

        self.state = State::ReadingHeaders;
        let headers = self.read_headers(cursor).await?;
        self.discover_boundary(&headers);

        // Probe the line following the header/body separator
        let has_body = match cursor.next_line().await? {
            None => {
                debug!("EOF detected after headers");
                false
            }
            Some(line) if self.is_boundary(&line) => {
                debug!("Content is empty for this part");
                cursor.push_back(line);
                false
            }
            Some(line) => {
                debug!("Content ready for read");
                cursor.push_back(line);
                true
            }
        };

        self.parts_produced += 1;
        self.state = if has_body {
            State::BodyReady
        } else {
            State::SeekingPart
        };

        Ok(Some(PartStart { headers, has_body }))
    }

    /// Moves past the next boundary line. Returns `false` at end of message,
    /// and `true` with the cursor on the first header line of a new part.
    async fn seek_part<S>(&mut self, cursor: &mut LineCursor<S>) -> Result<bool>
    where
        S: Stream<Item = io::Result<Line>> + Unpin,
    {
        loop {
            let line = match cursor.next_line().await? {
                Some(line) => line,
                None => return self.end_of_input(),
            };
            debug!("Seeking part, read: {}", line.preview(PREVIEW_LEN));

            if self.is_boundary(&line) {
                // A boundary followed by a blank line or EOF ends the message
                match cursor.next_line().await? {
                    None => {
                        debug!("Content ends at boundary followed by EOF");
                        return Ok(false);
                    }
                    Some(next) if next.is_blank() => {
                        debug!("Content ends at boundary followed by blank line");
                        return Ok(false);
                    }
                    Some(next) => {
                        cursor.push_back(next);
                        return Ok(true);
                    }
                }
            }

            if self.parts_produced > 0 {
                debug!("Discarding stray line between parts");
                continue;
            }

            if line.is_blank() {
                continue;
            }

            // With a known boundary, leading lines can only be preamble
            match self.leading {
                LeadingContent::Envelope if self.boundary.is_none() => {
                    debug!("Leading headers found before first boundary");
                    cursor.push_back(line);
                    return Ok(true);
                }
                LeadingContent::Envelope | LeadingContent::Discard => {
                    debug!("Discarding preamble line");
                }
                LeadingContent::Reject => {
                    return Err(Error::parsing(format!(
                        "unexpected content before first boundary: {:?}",
                        line.preview(PREVIEW_LEN)
                    )));
                }
            }
        }
    }

    fn end_of_input(&self) -> Result<bool> {
        if self.parts_produced == 0 {
            return Err(Error::parsing("no MIME part found before end of input"));
        }
        match self.termination {
            Termination::Lenient => {
                debug!("Content ends at end of input");
                Ok(false)
            }
            Termination::Strict => Err(Error::parsing(
                "end of input reached before the closing boundary",
            )),
        }
    }

    async fn read_headers<S>(&mut self, cursor: &mut LineCursor<S>) -> Result<HeaderMap>
    where
        S: Stream<Item = io::Result<Line>> + Unpin,
    {
        let mut lines: Vec<String> = Vec::new();
        let mut total = 0;

        loop {
            let line = cursor.next_line().await?.ok_or_else(|| {
                Error::parsing("Error parsing malformed content: header block not terminated")
            })?;

            // Right-trim only; leading whitespace marks a folded continuation
            let text = String::from_utf8_lossy(line.content());
            let trimmed = text.trim_end();
            if trimmed.is_empty() {
                break;
            }

            total += trimmed.len() + 2;
            if total > self.max_header_bytes {
                return Err(Error::MessageTooLarge);
            }
            lines.push(trimmed.to_string());
        }

        debug!("End headers {:?}", lines);
        HeaderMap::parse_with_limits(&lines.join("\r\n"), self.max_header_bytes, self.max_headers)
    }

    fn discover_boundary(&mut self, headers: &HeaderMap) {
        if self.boundary.is_some() {
            return;
        }
        if let Some(token) = headers.content_type().and_then(multipart_boundary) {
            debug!("Found boundary from headers: {}", token);
            self.boundary = Some(Boundary::new(token));
        }
    }
}
