//! Lazy reader for a single part's body.

use crate::config::Termination;
use crate::cursor::LineCursor;
use crate::engine::Boundary;
use crate::error::{Error, Result};
use crate::line::Line;
use bytes::{Bytes, BytesMut};
use futures::future::poll_fn;
use futures::{ready, Stream};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tracing::{debug, error};

/// Read position within the current body.
///
/// Kept by the streamer rather than the reader so a body that was dropped
/// half-read can still be drained.
#[derive(Debug, Default)]
pub(crate) struct BodyState {
    // More lines may belong to the body
    live: bool,
    // Unread remainder of the last line taken from the cursor
    chunk: Bytes,
}

impl BodyState {
    pub(crate) fn bound(has_body: bool) -> Self {
        Self {
            live: has_body,
            chunk: Bytes::new(),
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        !self.live && self.chunk.is_empty()
    }
}

/// The body of one part, read lazily from the shared line cursor.
///
/// Reading stops at the next boundary line, which is left on the cursor for
/// the streamer. Once a boundary (or end of input) is seen the reader stays
/// exhausted; later reads return nothing without touching the stream.
///
/// Line delimiters are restored exactly as they appeared in the input, so
/// binary and base64 payloads come back byte-for-byte. Note that the line
/// break in front of a boundary belongs to the body here.
pub struct Content<'a, S> {
    cursor: &'a mut LineCursor<S>,
    boundary: Option<&'a Boundary>,
    state: &'a mut BodyState,
    termination: Termination,
}

impl<'a, S> Content<'a, S>
where
    S: Stream<Item = io::Result<Line>> + Unpin,
{
    pub(crate) fn new(
        cursor: &'a mut LineCursor<S>,
        boundary: Option<&'a Boundary>,
        state: &'a mut BodyState,
        termination: Termination,
    ) -> Self {
        Self {
            cursor,
            boundary,
            state,
            termination,
        }
    }

    /// Returns `true` once the body has been read up to its boundary.
    pub fn is_exhausted(&self) -> bool {
        self.state.is_finished()
    }

    /// Polls for up to `max` bytes. An empty chunk means the body is exhausted.
    pub fn poll_chunk(&mut self, cx: &mut Context<'_>, max: usize) -> Poll<io::Result<Bytes>> {
        loop {
            if max == 0 {
                return Poll::Ready(Ok(Bytes::new()));
            }

            if !self.state.chunk.is_empty() {
                let n = max.min(self.state.chunk.len());
                return Poll::Ready(Ok(self.state.chunk.split_to(n)));
            }

            if !self.state.live {
                return Poll::Ready(Ok(Bytes::new()));
            }

            match ready!(self.cursor.poll_next_line(cx)) {
                Err(e) => return Poll::Ready(Err(e)),
                Ok(None) => {
                    self.state.live = false;
                    if self.termination == Termination::Strict {
                        return Poll::Ready(Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            Error::parsing("part body not terminated by a boundary"),
                        )));
                    }
                    debug!("Content reached end of input");
                }
                Ok(Some(line)) => {
                    if self.boundary.map_or(false, |b| b.matches(line.content())) {
                        debug!("Content detected boundary");
                        self.cursor.push_back(line);
                        self.state.live = false;
                    } else {
                        self.state.chunk = line.into_bytes_with_ending();
                    }
                }
            }
        }
    }

    /// Reads up to `max` bytes, returning the currently buffered line
    /// remainder or the next line. An empty result means the body is exhausted.
    pub async fn chunk(&mut self, max: usize) -> io::Result<Bytes> {
        poll_fn(|cx| self.poll_chunk(cx, max)).await
    }

    /// Reads at most `n` bytes; fewer are returned only at the boundary or
    /// end of input.
    pub async fn read_up_to(&mut self, n: usize) -> io::Result<Bytes> {
        let mut out = BytesMut::new();
        while out.len() < n {
            let chunk = self.chunk(n - out.len()).await?;
            if chunk.is_empty() {
                break;
            }
            out.extend_from_slice(&chunk);
        }
        Ok(out.freeze())
    }

    /// Reads everything up to the boundary.
    pub async fn read_to_boundary(&mut self) -> io::Result<Bytes> {
        let mut out = BytesMut::new();
        loop {
            let chunk = self.chunk(usize::MAX).await?;
            if chunk.is_empty() {
                return Ok(out.freeze());
            }
            out.extend_from_slice(&chunk);
        }
    }

    /// Discards the rest of the body, returning the number of bytes dropped.
    ///
    /// A read failure is logged and returned as [`Error::Drain`].
    pub async fn drain(&mut self) -> Result<u64> {
        let mut drained = 0u64;
        loop {
            match self.chunk(usize::MAX).await {
                Ok(chunk) if chunk.is_empty() => break,
                Ok(chunk) => drained += chunk.len() as u64,
                Err(source) => {
                    error!(
                        "Error flushing part content after {} bytes: {}",
                        drained, source
                    );
                    return Err(Error::Drain { drained, source });
                }
            }
        }

        if drained > 0 {
            debug!("Flushed unread part content of size {} bytes", drained);
        } else {
            debug!("Part content was fully read before exit");
        }
        Ok(drained)
    }
}

impl<'a, S> AsyncRead for Content<'a, S>
where
    S: Stream<Item = io::Result<Line>> + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let chunk = ready!(this.poll_chunk(cx, buf.remaining()))?;
        buf.put_slice(&chunk);
        Poll::Ready(Ok(()))
    }
}
