//! Splits a chunked byte stream into delimiter-terminated text frames.
//!
//! Chunks may end anywhere: in the middle of a frame, of a delimiter, or of
//! a multi-byte UTF-8 sequence. Bytes are buffered until a delimiter is seen
//! and only complete frames are decoded.

use futures_util::{Stream, StreamExt};
use memchr::memmem;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use crate::Error;

/// Upper bound for bytes buffered without seeing a delimiter.
const MAX_BUFFERED_BYTES: usize = 1_000_000;

/// What to do with bytes left in the buffer when the inner stream ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tail {
    /// Yield the remainder as a final frame if it is non-blank.
    Emit,
    /// Drop the remainder; an unterminated frame is never yielded.
    Discard,
}

/// A stream of text frames cut from a byte stream at a fixed delimiter.
///
/// A frame that is not valid UTF-8 is yielded as an `Err` item and the
/// stream carries on with the next frame. An error from the inner stream is
/// yielded once and ends the stream.
pub struct FrameStream<S> {
    inner: S,
    finder: memmem::Finder<'static>,
    delimiter_len: usize,
    tail: Tail,
    buffer: Vec<u8>,
    frames: VecDeque<Result<String, Error>>,
    finished: bool,
}

impl<S> FrameStream<S> {
    pub fn new(stream: S, delimiter: &'static [u8], tail: Tail) -> Self {
        Self {
            inner: stream,
            finder: memmem::Finder::new(delimiter),
            delimiter_len: delimiter.len(),
            tail,
            buffer: Vec::new(),
            frames: VecDeque::new(),
            finished: false,
        }
    }

    fn split_buffer(&mut self) {
        let mut start = 0;

        while let Some(pos) = self.finder.find(&self.buffer[start..]) {
            let end = start + pos;
            let frame = std::str::from_utf8(&self.buffer[start..end])
                .map(str::to_owned)
                .map_err(|e| Error::malformed_event(format!("invalid UTF-8 in frame: {e}")));
            self.frames.push_back(frame);
            start = end + self.delimiter_len;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
    }

    fn take_tail(&mut self) -> Option<Result<String, Error>> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.is_empty() {
            return None;
        }

        match self.tail {
            Tail::Discard => {
                tracing::debug!(bytes = rest.len(), "discarding unterminated frame");
                None
            }
            Tail::Emit => match String::from_utf8(rest) {
                Ok(text) if !text.trim().is_empty() => Some(Ok(text)),
                Ok(_) => None,
                Err(e) => Some(Err(Error::malformed_event(format!(
                    "invalid UTF-8 in final frame: {e}"
                )))),
            },
        }
    }
}

impl<S, E> Stream for FrameStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Item = Result<String, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(frame) = self.frames.pop_front() {
                return Poll::Ready(Some(frame));
            }

            if self.finished {
                return Poll::Ready(None);
            }

            match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    self.buffer.extend_from_slice(&chunk);
                    self.split_buffer();

                    // Only an unterminated frame counts against the limit.
                    if self.buffer.len() > MAX_BUFFERED_BYTES {
                        self.buffer.clear();
                        self.finished = true;
                        self.frames.push_back(Err(Error::streaming(
                            "frame buffer exceeded maximum size",
                        )));
                    }
                }
                Some(Err(e)) => {
                    let e: Box<dyn std::error::Error + Send + Sync> = e.into();
                    self.finished = true;
                    self.buffer.clear();
                    return Poll::Ready(Some(Err(Error::streaming(format!("stream error: {e}")))));
                }
                None => {
                    self.finished = true;
                    if let Some(frame) = self.take_tail() {
                        return Poll::Ready(Some(frame));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn chunks(parts: &[&[u8]]) -> Vec<Result<bytes::Bytes, std::io::Error>> {
        parts
            .iter()
            .map(|part| Ok(bytes::Bytes::copy_from_slice(part)))
            .collect()
    }

    #[tokio::test]
    async fn test_frames_split_across_chunks() {
        let source = stream::iter(chunks(&[b"one\ntw", b"o\n", b"\nthree\n"]));
        let frames: Vec<_> = FrameStream::new(source, b"\n", Tail::Discard)
            .map(|frame| frame.unwrap())
            .collect()
            .await;
        assert_eq!(frames, vec!["one", "two", "", "three"]);
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_chunks() {
        let euro = "€".as_bytes();
        let first = [b"price ".as_slice(), &euro[..1]].concat();
        let second = [&euro[1..], b"5\n".as_slice()].concat();
        let source = stream::iter(chunks(&[&first, &second]));

        let frames: Vec<_> = FrameStream::new(source, b"\n", Tail::Discard)
            .map(|frame| frame.unwrap())
            .collect()
            .await;
        assert_eq!(frames, vec!["price €5"]);
    }

    #[tokio::test]
    async fn test_tail_policies() {
        let source = stream::iter(chunks(&[b"complete\n\npartial"]));
        let emitted: Vec<_> = FrameStream::new(source, b"\n\n", Tail::Emit)
            .map(|frame| frame.unwrap())
            .collect()
            .await;
        assert_eq!(emitted, vec!["complete", "partial"]);

        let source = stream::iter(chunks(&[b"complete\npartial"]));
        let discarded: Vec<_> = FrameStream::new(source, b"\n", Tail::Discard)
            .map(|frame| frame.unwrap())
            .collect()
            .await;
        assert_eq!(discarded, vec!["complete"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_frame_does_not_end_stream() {
        let source = stream::iter(chunks(&[b"ok\n\xFF\xFE\nnext\n"]));
        let frames: Vec<_> = FrameStream::new(source, b"\n", Tail::Discard).collect().await;

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].as_ref().unwrap(), "ok");
        assert!(matches!(frames[1], Err(Error::MalformedEvent(_))));
        assert_eq!(frames[2].as_ref().unwrap(), "next");
    }

    #[tokio::test]
    async fn test_large_chunk_of_complete_frames() {
        let line = "data: {\"char\":\"a\",\"fullText\":\"a\",\"currentLength\":1}\n";
        let count = MAX_BUFFERED_BYTES / line.len() + 100;
        let payload = line.repeat(count);
        assert!(payload.len() > MAX_BUFFERED_BYTES);

        let source = stream::iter(chunks(&[payload.as_bytes()]));
        let frames: Vec<_> = FrameStream::new(source, b"\n", Tail::Discard).collect().await;

        assert_eq!(frames.len(), count);
        assert!(frames.iter().all(|frame| frame.is_ok()));
    }

    #[tokio::test]
    async fn test_oversized_unterminated_frame_ends_stream() {
        let mut payload = b"first\n".to_vec();
        payload.extend(std::iter::repeat(b'x').take(MAX_BUFFERED_BYTES + 1));

        let source = stream::iter(chunks(&[&payload, b"\nnever\n"]));
        let frames: Vec<_> = FrameStream::new(source, b"\n", Tail::Discard).collect().await;

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref().unwrap(), "first");
        assert!(matches!(frames[1], Err(Error::Streaming(_))));
    }

    #[tokio::test]
    async fn test_inner_error_ends_stream() {
        let source = stream::iter(vec![
            Ok(bytes::Bytes::from_static(b"first\n")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(bytes::Bytes::from_static(b"never\n")),
        ]);
        let frames: Vec<_> = FrameStream::new(source, b"\n", Tail::Discard).collect().await;

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref().unwrap(), "first");
        assert!(matches!(frames[1], Err(Error::Streaming(_))));
    }
}
