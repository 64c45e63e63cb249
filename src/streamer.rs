//! Streaming multipart reader.
//!
//! [`MimeStreamer`] hands out one [`Part`] at a time. A part borrows the
//! streamer mutably, so at most one body can be live; whatever the caller
//! leaves unread is drained before the streamer moves on, no matter how the
//! part's scope was left.

use crate::config::{LeadingContent, StreamerConfig};
use crate::content::{BodyState, Content};
use crate::cursor::LineCursor;
use crate::engine::BoundaryEngine;
use crate::error::{Error, Result};
use crate::header::HeaderMap;
use crate::line::{Line, LineCodec};
use crate::media_type::parse_media_type;
use bytes::{Buf, Bytes};
use futures::Stream;
use pin_project::pin_project;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

/// Line source over any [`AsyncRead`].
pub type ReaderLines<R> = FramedRead<R, LineCodec>;

/// Line source over a stream of byte chunks, such as an HTTP response body.
pub type BodyLines<St, B> = FramedRead<StreamReader<St, B>, LineCodec>;

/// One part of a multipart message: its headers and a lazy body reader.
///
/// `Part` implements [`AsyncRead`] over its body.
#[pin_project]
pub struct Part<'a, S> {
    /// The part's headers.
    pub headers: HeaderMap,

    #[pin]
    content: Content<'a, S>,
}

impl<'a, S> Part<'a, S>
where
    S: Stream<Item = io::Result<Line>> + Unpin,
{
    /// The part's body reader.
    pub fn content(&mut self) -> &mut Content<'a, S> {
        &mut self.content
    }

    /// Discards the unread rest of the body, returning the bytes dropped.
    pub async fn drain(&mut self) -> Result<u64> {
        self.content.drain().await
    }

    /// Reads the rest of the body into memory.
    pub async fn into_owned(mut self) -> Result<OwnedPart> {
        let content = self.content.read_to_boundary().await?;
        Ok(OwnedPart {
            headers: self.headers,
            content,
        })
    }
}

impl<'a, S> AsyncRead for Part<'a, S>
where
    S: Stream<Item = io::Result<Line>> + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.project();
        this.content.poll_read(cx, buf)
    }
}

/// A part whose body has been read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedPart {
    /// The part's headers.
    pub headers: HeaderMap,
    /// The complete body.
    pub content: Bytes,
}

/// Incremental parser for MIME multipart content.
///
/// # Examples
///
/// ```
/// use mime_streamer::MimeStreamer;
///
/// # async fn example() -> mime_streamer::Result<()> {
/// let data = b"Content-Type: multipart/related; boundary=b\r\n\r\n\
/// --b\r\nContent-ID: <a>\r\n\r\nhello\r\n--b\r\n\r\n";
/// let mut streamer = MimeStreamer::new(&data[..]);
///
/// while let Some(mut part) = streamer.next_part().await? {
///     let body = part.content().read_to_boundary().await?;
///     println!("{:?}: {} bytes", part.headers.content_id(), body.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MimeStreamer<S> {
    cursor: LineCursor<S>,
    engine: BoundaryEngine,
    body: BodyState,
}

impl<R> MimeStreamer<ReaderLines<R>>
where
    R: AsyncRead + Unpin,
{
    /// Creates a streamer over `reader` with the default configuration. The
    /// boundary is discovered from the first part's `Content-Type`.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, StreamerConfig::default())
    }

    /// Creates a streamer over `reader` with an explicit configuration.
    pub fn with_config(reader: R, config: StreamerConfig) -> Self {
        let lines = FramedRead::new(reader, LineCodec::with_max_length(config.max_line_length));
        Self::from_lines(lines, config)
    }
}

impl<St, B, E> MimeStreamer<BodyLines<St, B>>
where
    St: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: Buf + Unpin,
    E: Into<io::Error>,
{
    /// Creates a streamer over a response body whose top-level headers were
    /// delivered out of band, e.g. by HTTP.
    ///
    /// `content_type` must be `multipart/*` with a `boundary` parameter.
    /// Anything before the first boundary line is treated as preamble.
    pub fn from_body(content_type: &str, body: St) -> Result<Self> {
        let config = body_config(content_type)?;
        let reader = StreamReader::new(body);
        Ok(Self::from_lines(
            FramedRead::new(reader, LineCodec::with_max_length(config.max_line_length)),
            config,
        ))
    }
}

impl<S> MimeStreamer<S>
where
    S: Stream<Item = io::Result<Line>> + Unpin,
{
    /// Creates a streamer over any line source.
    pub fn from_lines(lines: S, config: StreamerConfig) -> Self {
        Self {
            cursor: LineCursor::new(lines),
            engine: BoundaryEngine::new(&config),
            body: BodyState::default(),
        }
    }

    /// The boundary token in use, whether configured or discovered.
    pub fn boundary(&self) -> Option<&str> {
        self.engine.boundary().map(|b| b.token())
    }

    /// Number of parts produced so far.
    pub fn parts_read(&self) -> u64 {
        self.engine.parts_produced()
    }

    /// Returns `true` once the end of the message has been reached.
    pub fn is_finished(&self) -> bool {
        self.engine.is_ended()
    }

    /// Returns the next part, or [`Error::NoPart`] once the message has ended.
    pub async fn get_next_part(&mut self) -> Result<Part<'_, S>> {
        self.next_part().await?.ok_or(Error::NoPart)
    }

    /// Returns the next part, or `None` once the message has ended.
    ///
    /// Any body left unread by the previous part is drained first.
    pub async fn next_part(&mut self) -> Result<Option<Part<'_, S>>> {
        self.finish_part().await?;

        let start = match self.engine.next_part(&mut self.cursor).await? {
            Some(start) => start,
            None => return Ok(None),
        };

        self.body = BodyState::bound(start.has_body);
        let content = Content::new(
            &mut self.cursor,
            self.engine.boundary(),
            &mut self.body,
            self.engine.termination(),
        );
        Ok(Some(Part {
            headers: start.headers,
            content,
        }))
    }

    /// Reads every remaining part into memory and passes it to `f`.
    ///
    /// Stops at the end of the message or at the first error.
    pub async fn for_each_part<F, Fut>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(OwnedPart) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        while let Some(part) = self.next_part().await? {
            let owned = part.into_owned().await?;
            f(owned).await?;
        }
        Ok(())
    }

    /// Consumes the streamer, returning the line cursor.
    ///
    /// A body left unread by the last part is drained first, so the cursor
    /// is at the next boundary line (still pending on the cursor) or past
    /// the end of the message.
    pub async fn into_inner(mut self) -> Result<LineCursor<S>> {
        self.finish_part().await?;
        Ok(self.cursor)
    }

    pub(crate) async fn finish_part(&mut self) -> Result<()> {
        if !self.body.is_finished() {
            Content::new(
                &mut self.cursor,
                self.engine.boundary(),
                &mut self.body,
                self.engine.termination(),
            )
            .drain()
            .await?;
        }
        self.engine.finish_body();
        Ok(())
    }
}

fn body_config(content_type: &str) -> Result<StreamerConfig> {
    let (media_type, mut params) = parse_media_type(content_type)?;
    if !media_type.starts_with("multipart/") {
        return Err(Error::NotMultipart(media_type));
    }
    let boundary = params
        .remove("boundary")
        .filter(|b| !b.is_empty())
        .ok_or(Error::MissingBoundary)?;

    StreamerConfig::new()
        .with_boundary(boundary)
        .map(|config| config.leading_content(LeadingContent::Discard))
}
