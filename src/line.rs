//! Line records and the codec that cuts a byte stream into them.

use bytes::{Bytes, BytesMut};
use std::io;
use tokio_util::codec::Decoder;

/// Default upper bound for a single line, delimiter excluded.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1 << 20; // 1 MB

/// The delimiter that terminated a line before it was stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// `\r\n`
    CrLf,
    /// `\n`
    Lf,
    /// Final line of the source, not terminated.
    None,
}

impl LineEnding {
    /// The delimiter bytes.
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::CrLf => b"\r\n",
            LineEnding::Lf => b"\n",
            LineEnding::None => b"",
        }
    }
}

/// A single line with its delimiter stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    content: Bytes,
    ending: LineEnding,
}

impl Line {
    /// Creates a line from stripped content and the delimiter it had.
    pub fn new(content: impl Into<Bytes>, ending: LineEnding) -> Self {
        Self {
            content: content.into(),
            ending,
        }
    }

    /// The line content without its delimiter.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// The delimiter that was stripped from this line.
    pub fn ending(&self) -> LineEnding {
        self.ending
    }

    /// Length of the line once its delimiter is restored.
    pub fn len_with_ending(&self) -> usize {
        self.content.len() + self.ending.as_bytes().len()
    }

    /// Returns `true` if the line is empty after trimming ASCII whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.iter().all(|b| b.is_ascii_whitespace())
    }

    /// Returns the line with its original delimiter appended.
    pub fn into_bytes_with_ending(self) -> Bytes {
        match self.ending {
            LineEnding::None => self.content,
            ending => {
                let mut buf = BytesMut::with_capacity(self.len_with_ending());
                buf.extend_from_slice(&self.content);
                buf.extend_from_slice(ending.as_bytes());
                buf.freeze()
            }
        }
    }

    /// Lossy UTF-8 preview of at most `max` bytes, for log output.
    pub(crate) fn preview(&self, max: usize) -> String {
        let end = self.content.len().min(max);
        let ellipsis = if self.content.len() > max { "..." } else { "" };
        format!("{}{}", String::from_utf8_lossy(&self.content[..end]), ellipsis)
    }
}

impl From<&str> for Line {
    /// Builds a CRLF-terminated line.
    fn from(s: &str) -> Self {
        Line::new(Bytes::copy_from_slice(s.as_bytes()), LineEnding::CrLf)
    }
}

impl From<Vec<u8>> for Line {
    /// Builds a CRLF-terminated line.
    fn from(v: Vec<u8>) -> Self {
        Line::new(v, LineEnding::CrLf)
    }
}

/// Splits bytes on `\n`, stripping `\r\n` or `\n` and recording which one was seen.
///
/// A trailing partial line at EOF is emitted with [`LineEnding::None`].
#[derive(Debug, Clone)]
pub struct LineCodec {
    max_length: usize,
    // Bytes already scanned for '\n' in the current buffer
    next_index: usize,
}

impl LineCodec {
    /// Creates a codec with [`DEFAULT_MAX_LINE_LENGTH`].
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Creates a codec that rejects lines longer than `max_length` bytes.
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
        }
    }

    /// The configured maximum line length.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    fn too_long(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line exceeds maximum length of {} bytes", self.max_length),
        )
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = Line;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> io::Result<Option<Line>> {
        let newline = buf[self.next_index..].iter().position(|&b| b == b'\n');

        match newline {
            Some(offset) => {
                let pos = self.next_index + offset;
                self.next_index = 0;

                let mut raw = buf.split_to(pos + 1);
                raw.truncate(pos);
                let ending = if raw.last() == Some(&b'\r') {
                    raw.truncate(pos - 1);
                    LineEnding::CrLf
                } else {
                    LineEnding::Lf
                };

                if raw.len() > self.max_length {
                    return Err(self.too_long());
                }
                Ok(Some(Line::new(raw.freeze(), ending)))
            }
            None => {
                // Leave room for a trailing '\r' in front of the next '\n'
                if buf.len() > self.max_length + 1 {
                    return Err(self.too_long());
                }
                self.next_index = buf.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> io::Result<Option<Line>> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }

        self.next_index = 0;
        if buf.is_empty() {
            return Ok(None);
        }

        let rest = buf.split_to(buf.len());
        if rest.len() > self.max_length {
            return Err(self.too_long());
        }
        Ok(Some(Line::new(rest.freeze(), LineEnding::None)))
    }
}
