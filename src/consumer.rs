//! Client side of `POST /generate-description`: reads the event stream as it
//! arrives and keeps a live draft of the description.

use futures_util::{Stream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::frame_stream::{FrameStream, Tail};
use crate::{Error, GenerationEvent, GenerationRequest, EVENT_PREFIX};

/// Bounds of the word-limit input control.
pub const MIN_WORD_LIMIT: usize = 5;
pub const MAX_WORD_LIMIT: usize = 100;

/// Clamp a user-entered word limit to what the input control allows.
pub fn clamp_word_limit(limit: i64) -> usize {
    limit.clamp(MIN_WORD_LIMIT as i64, MAX_WORD_LIMIT as i64) as usize
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DraftStatus {
    #[default]
    Idle,
    Streaming,
    Done,
    Failed(String),
}

/// The description as currently displayed.
#[derive(Debug, Clone, Default)]
pub struct DescriptionDraft {
    text: String,
    status: DraftStatus,
}

impl DescriptionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> &DraftStatus {
        &self.status
    }

    /// Clear any previous description and start streaming.
    pub fn begin(&mut self) {
        self.text.clear();
        self.status = DraftStatus::Streaming;
    }

    /// Apply one event. Returns `true` when the event ends the stream.
    pub fn apply(&mut self, event: GenerationEvent) -> bool {
        match event {
            GenerationEvent::Char { ch, .. } => {
                self.text.push(ch);
                false
            }
            GenerationEvent::Done { description, .. } => {
                self.text = description;
                self.status = DraftStatus::Done;
                true
            }
            GenerationEvent::Error { error } => {
                self.status = DraftStatus::Failed(error);
                true
            }
        }
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.status = DraftStatus::Failed(message.into());
    }
}

/// Parse one complete line of the event stream.
///
/// Blank lines and lines without the `data: ` prefix carry no event.
pub fn parse_event_line(line: &str) -> Option<Result<GenerationEvent, Error>> {
    let line = line.trim_end_matches('\r');
    let payload = line.strip_prefix(EVENT_PREFIX)?;
    Some(GenerationEvent::from_payload(payload))
}

/// Decode a chunked response body into generation events.
///
/// Lines are only parsed once their newline has arrived; a trailing
/// unterminated fragment is dropped when the body ends.
pub fn decode_events<S, E>(body: S) -> impl Stream<Item = Result<GenerationEvent, Error>>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    FrameStream::new(body, b"\n", Tail::Discard).filter_map(|line| async move {
        match line {
            Ok(line) => parse_event_line(&line),
            Err(e) => Some(Err(e)),
        }
    })
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the description endpoint.
pub struct DescriptionClient {
    http: Client,
    endpoint: String,
}

impl DescriptionClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            http: Client::builder().build()?,
            endpoint: format!("{}/generate-description", base_url.trim_end_matches('/')),
        })
    }

    /// Generate a description for `title`, calling `on_update` after every
    /// change of the draft. Returns the final cleaned description.
    ///
    /// One attempt per call; failures are returned, never retried.
    pub async fn generate<F>(
        &self,
        title: &str,
        word_limit: i64,
        mut on_update: F,
    ) -> Result<String, Error>
    where
        F: FnMut(&DescriptionDraft),
    {
        if title.trim().is_empty() {
            return Err(Error::invalid_request("task title is required"));
        }
        let request = GenerationRequest::new(title.trim(), clamp_word_limit(word_limit))?;

        let mut draft = DescriptionDraft::new();
        draft.begin();
        on_update(&draft);

        let response = match self.http.post(&self.endpoint).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                draft.fail(e.to_string());
                on_update(&draft);
                return Err(Error::transport(format!("request failed: {e}")));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|body| body.error)
                .unwrap_or(body);
            draft.fail(message.clone());
            on_update(&draft);
            return Err(if status == StatusCode::BAD_REQUEST {
                Error::invalid_request(message)
            } else {
                Error::transport(format!("{status}: {message}"))
            });
        }

        let mut events = Box::pin(decode_events(response.bytes_stream()));
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    let terminal = draft.apply(event);
                    on_update(&draft);
                    if terminal {
                        break;
                    }
                }
                Err(Error::MalformedEvent(reason)) => {
                    warn!(%reason, "skipping malformed event line");
                }
                Err(e) => {
                    draft.fail(e.to_string());
                    on_update(&draft);
                    return Err(Error::transport(e.to_string()));
                }
            }
        }

        match draft.status() {
            DraftStatus::Done => {
                debug!(chars = draft.text().chars().count(), "description received");
                Ok(draft.text().to_string())
            }
            DraftStatus::Failed(message) => Err(Error::Upstream(message.clone())),
            DraftStatus::Idle | DraftStatus::Streaming => {
                draft.fail("stream ended before completion");
                on_update(&draft);
                Err(Error::transport("stream ended before completion"))
            }
        }
    }
}
