//! `multipart/related` (XOP) streaming with an eagerly loaded manifest.
//!
//! An XOP package (`application/xop+xml` inside `multipart/related`) starts
//! with a root XML document that references the binary parts following it by
//! `Content-ID`. [`XopStreamer`] reads that first part into memory up front
//! and then streams the attachments like [`MimeStreamer`].

use crate::config::{LeadingContent, StreamerConfig};
use crate::error::{Error, Result};
use crate::line::Line;
use crate::media_type::parse_media_type;
use crate::streamer::{BodyLines, MimeStreamer, OwnedPart, Part, ReaderLines};
use bytes::Buf;
use futures::Stream;
use std::collections::HashMap;
use std::io;
use tokio::io::AsyncRead;
use tracing::debug;

const MULTIPART_RELATED: &str = "multipart/related";

/// Streamer for `multipart/related` content whose first part is a manifest.
#[derive(Debug)]
pub struct XopStreamer<S> {
    inner: MimeStreamer<S>,
    manifest: OwnedPart,
    params: HashMap<String, String>,
}

impl<R> XopStreamer<ReaderLines<R>>
where
    R: AsyncRead + Unpin,
{
    /// Creates a streamer over `reader` given the package's `Content-Type`,
    /// and loads the manifest part.
    ///
    /// # Examples
    ///
    /// ```
    /// use mime_streamer::XopStreamer;
    ///
    /// # async fn example() -> mime_streamer::Result<()> {
    /// let body = b"--MIME_boundary\r\n\
    /// Content-Type: application/xop+xml\r\n\
    /// Content-ID: <root@example.org>\r\n\
    /// \r\n\
    /// <doc/>\r\n\
    /// --MIME_boundary\r\n\
    /// Content-ID: <image@example.org>\r\n\
    /// \r\n\
    /// \x89PNG\r\n\
    /// --MIME_boundary--\r\n";
    /// let ct = "multipart/related; type=\"application/xop+xml\"; boundary=\"MIME_boundary\"";
    ///
    /// let mut streamer = XopStreamer::new(ct, &body[..]).await?;
    /// assert_eq!(streamer.manifest().headers.content_id(), Some("<root@example.org>"));
    ///
    /// let mut image = streamer.get_next_part().await?;
    /// let png = image.content().read_to_boundary().await?;
    /// assert_eq!(&png[..], b"\x89PNG\r\n");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(content_type: &str, reader: R) -> Result<Self> {
        let (config, params) = related_config(content_type)?;
        Self::load(MimeStreamer::with_config(reader, config), params).await
    }
}

impl<St, B, E> XopStreamer<BodyLines<St, B>>
where
    St: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: Buf + Unpin,
    E: Into<io::Error>,
{
    /// Creates a streamer over a response body given its `Content-Type`, and
    /// loads the manifest part.
    pub async fn from_body(content_type: &str, body: St) -> Result<Self> {
        let (_, params) = related_config(content_type)?;
        Self::load(MimeStreamer::from_body(content_type, body)?, params).await
    }
}

impl<S> XopStreamer<S>
where
    S: Stream<Item = io::Result<Line>> + Unpin,
{
    /// Creates a streamer over any line source given the package's
    /// `Content-Type`, and loads the manifest part.
    pub async fn from_lines(content_type: &str, lines: S) -> Result<Self> {
        let (config, params) = related_config(content_type)?;
        Self::load(MimeStreamer::from_lines(lines, config), params).await
    }

    async fn load(mut inner: MimeStreamer<S>, params: HashMap<String, String>) -> Result<Self> {
        let manifest = match inner.get_next_part().await {
            Ok(part) => part.into_owned().await?,
            Err(Error::NoPart) => {
                return Err(Error::parsing("multipart/related content has no manifest part"));
            }
            Err(e) => return Err(e),
        };
        debug!(
            "Loaded manifest part {:?} ({} bytes)",
            manifest.headers.content_id(),
            manifest.content.len()
        );

        Ok(Self {
            inner,
            manifest,
            params,
        })
    }

    /// The first part, read into memory.
    pub fn manifest(&self) -> &OwnedPart {
        &self.manifest
    }

    /// The `start` parameter: the `Content-ID` of the root part, if declared.
    pub fn start(&self) -> Option<&str> {
        self.param("start")
    }

    /// The `start-info` parameter, if declared.
    pub fn start_info(&self) -> Option<&str> {
        self.param("start-info")
    }

    /// The `type` parameter: the media type of the root part, if declared.
    pub fn root_type(&self) -> Option<&str> {
        self.param("type")
    }

    /// Any `Content-Type` parameter by lowercase name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The package boundary token.
    pub fn boundary(&self) -> Option<&str> {
        self.inner.boundary()
    }

    /// Returns the next attachment, or [`Error::NoPart`] after the last one.
    pub async fn get_next_part(&mut self) -> Result<Part<'_, S>> {
        self.inner.get_next_part().await
    }

    /// Returns the next attachment, or `None` after the last one.
    pub async fn next_part(&mut self) -> Result<Option<Part<'_, S>>> {
        self.inner.next_part().await
    }

    /// Consumes the wrapper, returning the manifest and the underlying
    /// streamer. A half-read attachment is drained first.
    pub async fn into_parts(mut self) -> Result<(OwnedPart, MimeStreamer<S>)> {
        self.inner.finish_part().await?;
        Ok((self.manifest, self.inner))
    }
}

fn related_config(content_type: &str) -> Result<(StreamerConfig, HashMap<String, String>)> {
    let (media_type, params) = parse_media_type(content_type)?;
    if media_type != MULTIPART_RELATED {
        return Err(Error::NotMultipartRelated(media_type));
    }

    let boundary = params
        .get("boundary")
        .filter(|b| !b.is_empty())
        .ok_or(Error::MissingBoundary)?;

    // Forward to the first boundary line; the package headers came out of band
    let config = StreamerConfig::new()
        .with_boundary(boundary.clone())?
        .leading_content(LeadingContent::Discard);
    Ok((config, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;

    const CONTENT_TYPE: &str = "multipart/related; type=\"application/xop+xml\"; \
start=\"<mymessage.xml@example.org>\"; start-info=\"text/xml\";\r\n\tboundary=\"MIME_boundary\"";

    const XOP: &[u8] = b"--MIME_boundary\r\n\
Content-Type: application/xop+xml; charset=UTF-8; type=\"text/xml\"\r\n\
Content-Transfer-Encoding: 8bit\r\n\
Content-ID: <mymessage.xml@example.org>\r\n\
\r\n\
<soap:Envelope xmlns:soap='http://www.w3.org/2003/05/soap-envelope'>\r\n\
<xop:Include href='cid:http://example.org/me.png'/>\r\n\
</soap:Envelope>\r\n\
\r\n\
--MIME_boundary\r\n\
Content-Type: image/png\r\n\
Content-Transfer-Encoding: binary\r\n\
Content-ID: <http://example.org/me.png>\r\n\
\r\n\
23580\r\n\
\r\n\
--MIME_boundary\r\n\
Content-Type: application/pkcs7-signature\r\n\
Content-Transfer-Encoding: binary\r\n\
Content-ID: <http://example.org/my.hsh>\r\n\
\r\n\
7923579\r\n\
--MIME_boundary--\r\n";

    #[tokio::test]
    async fn test_xop_example() {
        let mut streamer = XopStreamer::new(CONTENT_TYPE, XOP).await.unwrap();
        assert_eq!(streamer.boundary(), Some("MIME_boundary"));
        assert_eq!(streamer.start(), Some("<mymessage.xml@example.org>"));
        assert_eq!(streamer.start_info(), Some("text/xml"));
        assert_eq!(streamer.root_type(), Some("application/xop+xml"));

        let manifest = streamer.manifest();
        assert!(manifest
            .headers
            .get_or("content-type", "")
            .starts_with("application/xop+xml"));
        assert_eq!(manifest.headers.content_id(), Some("<mymessage.xml@example.org>"));
        assert!(manifest.content.starts_with(b"<soap:Envelope"));

        {
            let mut part = streamer.get_next_part().await.unwrap();
            assert_eq!(part.headers.content_id(), Some("<http://example.org/me.png>"));
            assert_eq!(&part.content().read_to_boundary().await.unwrap()[..], b"23580\r\n\r\n");
        }

        {
            let mut part = streamer.get_next_part().await.unwrap();
            assert_eq!(part.headers.content_id(), Some("<http://example.org/my.hsh>"));
            assert_eq!(&part.content().read_to_boundary().await.unwrap()[..], b"7923579\r\n");
        }

        assert!(streamer.next_part().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_from_body_chunks() {
        let chunks: Vec<io::Result<Bytes>> = XOP
            .chunks(7)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        let streamer = XopStreamer::from_body(CONTENT_TYPE, stream::iter(chunks))
            .await
            .unwrap();
        let (manifest, mut inner) = streamer.into_parts().await.unwrap();
        assert_eq!(manifest.headers.content_id(), Some("<mymessage.xml@example.org>"));

        let mut ids = Vec::new();
        while let Some(part) = inner.next_part().await.unwrap() {
            ids.push(part.headers.content_id().unwrap_or_default().to_string());
        }
        assert_eq!(ids, vec!["<http://example.org/me.png>", "<http://example.org/my.hsh>"]);
    }

    #[tokio::test]
    async fn test_into_parts_after_partial_attachment() {
        let mut streamer = XopStreamer::new(CONTENT_TYPE, XOP).await.unwrap();
        {
            let mut image = streamer.get_next_part().await.unwrap();
            assert_eq!(&image.content().read_up_to(3).await.unwrap()[..], b"235");
        }

        let (_, mut inner) = streamer.into_parts().await.unwrap();
        assert_eq!(inner.parts_read(), 2);
        let part = inner.get_next_part().await.unwrap();
        assert_eq!(part.headers.content_id(), Some("<http://example.org/my.hsh>"));
    }

    #[tokio::test]
    async fn test_rejects_other_content_types() {
        let err = XopStreamer::new("multipart/mixed; boundary=x", XOP).await.unwrap_err();
        assert!(matches!(err, Error::NotMultipartRelated(ref t) if t == "multipart/mixed"));

        let err = XopStreamer::new("multipart/related", XOP).await.unwrap_err();
        assert!(matches!(err, Error::MissingBoundary));
    }

    #[tokio::test]
    async fn test_missing_manifest() {
        let err = XopStreamer::new("multipart/related; boundary=b", &b"--b\r\n\r\n"[..])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Parsing(_)));
    }
}
