//! A line source with push-back.

use crate::line::Line;
use futures::future::poll_fn;
use futures::Stream;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Wraps a line stream so lines can be pushed back and read again.
///
/// Pushed-back lines are returned last-in, first-out before the source is
/// polled again. Once the source ends the cursor never polls it again.
#[derive(Debug)]
pub struct LineCursor<S> {
    source: S,
    pending: VecDeque<Line>,
    source_done: bool,
    lines_read: u64,
}

impl<S> LineCursor<S>
where
    S: Stream<Item = io::Result<Line>> + Unpin,
{
    /// Creates a cursor over `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            pending: VecDeque::with_capacity(2),
            source_done: false,
            lines_read: 0,
        }
    }

    /// Polls for the next line; `None` once the source is exhausted.
    pub fn poll_next_line(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<Option<Line>>> {
        if let Some(line) = self.pending.pop_front() {
            return Poll::Ready(Ok(Some(line)));
        }
        if self.source_done {
            return Poll::Ready(Ok(None));
        }

        match Pin::new(&mut self.source).poll_next(cx) {
            Poll::Ready(Some(Ok(line))) => {
                self.lines_read += 1;
                Poll::Ready(Ok(Some(line)))
            }
            Poll::Ready(Some(Err(e))) => Poll::Ready(Err(e)),
            Poll::Ready(None) => {
                self.source_done = true;
                Poll::Ready(Ok(None))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    /// Returns the next line; `None` once the source is exhausted.
    pub async fn next_line(&mut self) -> io::Result<Option<Line>> {
        poll_fn(|cx| self.poll_next_line(cx)).await
    }

    /// Re-queues `line` so it is the next one returned.
    pub fn push_back(&mut self, line: Line) {
        self.pending.push_front(line);
    }

    /// Returns `true` when nothing is pending and the source has ended.
    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty() && self.source_done
    }

    /// Number of lines pulled from the underlying source so far.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Consumes the cursor, returning the source. Pushed-back lines are lost.
    pub fn into_inner(self) -> S {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn cursor(lines: &[&str]) -> LineCursor<impl Stream<Item = io::Result<Line>> + Unpin> {
        let lines: Vec<io::Result<Line>> = lines.iter().map(|l| Ok(Line::from(*l))).collect();
        LineCursor::new(stream::iter(lines))
    }

    #[tokio::test]
    async fn test_next_line_until_end() {
        let mut c = cursor(&["a", "b"]);
        assert_eq!(c.next_line().await.unwrap().unwrap().content(), b"a");
        assert_eq!(c.next_line().await.unwrap().unwrap().content(), b"b");
        assert!(c.next_line().await.unwrap().is_none());
        assert!(c.is_exhausted());
        assert!(c.next_line().await.unwrap().is_none());
        assert_eq!(c.lines_read(), 2);
    }

    #[tokio::test]
    async fn test_push_back_is_lifo() {
        let mut c = cursor(&["a", "b", "c"]);
        let a = c.next_line().await.unwrap().unwrap();
        let b = c.next_line().await.unwrap().unwrap();
        c.push_back(b);
        c.push_back(a);
        assert_eq!(c.next_line().await.unwrap().unwrap().content(), b"a");
        assert_eq!(c.next_line().await.unwrap().unwrap().content(), b"b");
        assert_eq!(c.next_line().await.unwrap().unwrap().content(), b"c");
        // Push-backs are not counted as source reads
        assert_eq!(c.lines_read(), 3);
    }

    #[tokio::test]
    async fn test_push_back_after_end() {
        let mut c = cursor(&["only"]);
        let line = c.next_line().await.unwrap().unwrap();
        assert!(c.next_line().await.unwrap().is_none());
        c.push_back(line);
        assert!(!c.is_exhausted());
        assert_eq!(c.next_line().await.unwrap().unwrap().content(), b"only");
        assert!(c.next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_source_error_propagates() {
        let items = vec![
            Ok(Line::from("a")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ];
        let mut c = LineCursor::new(stream::iter(items));
        assert!(c.next_line().await.unwrap().is_some());
        let err = c.next_line().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }
}
