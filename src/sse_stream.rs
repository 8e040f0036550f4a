//! Parsing of the Server-Sent Events stream returned by the model provider.

use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::frame_stream::{FrameStream, Tail};
use crate::Error;

/// A Server-Sent Events (SSE) event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    /// Event type (optional).
    pub event_type: Option<String>,
    /// Event data.
    pub data: String,
}

impl SseEvent {
    /// Check if this is the `[DONE]` sentinel that closes OpenAI-style streams.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }

    /// Parse a single complete SSE event from its text representation.
    fn parse(event_text: &str) -> Option<SseEvent> {
        let mut event_type = None;
        let mut data_lines = Vec::new();

        for line in event_text.lines() {
            let line = line.trim_end();

            // Comments start with ':' (keep-alive pings)
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            if let Some((field, value)) = line.split_once(':') {
                let value = value.strip_prefix(' ').unwrap_or(value);
                match field {
                    "event" => event_type = Some(value.to_string()),
                    "data" => data_lines.push(value),
                    _ => {}
                }
            }
        }

        if data_lines.is_empty() {
            return None;
        }

        Some(SseEvent {
            event_type,
            data: data_lines.join("\n"),
        })
    }
}

/// Stream adapter turning provider bytes into SSE events.
pub struct SseStream<S> {
    frames: FrameStream<S>,
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Item = Result<SseEvent, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.frames.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(frame))) => {
                    if let Some(event) = SseEvent::parse(&frame) {
                        return Poll::Ready(Some(Ok(event)));
                    }
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Extension trait to add SSE parsing to byte streams.
pub trait SseStreamExt: Stream {
    /// Parse this byte stream as SSE events. Events are separated by a blank line;
    /// a final event without the trailing blank line is still delivered.
    fn sse_events(self) -> SseStream<Self>
    where
        Self: Sized,
    {
        SseStream {
            frames: FrameStream::new(self, b"\n\n", Tail::Emit),
        }
    }
}

impl<S: Stream> SseStreamExt for S {}
