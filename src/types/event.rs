//! The description generation request and the event protocol spoken over
//! `POST /generate-description`.
//!
//! Every event travels as one line `data: <JSON>` followed by a blank line.

use serde::{Deserialize, Serialize};

use crate::Error;

/// Prefix that marks an event line on the wire.
pub const EVENT_PREFIX: &str = "data: ";

/// A validated request to generate a task description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub title: String,
    /// Character budget for the generated text.
    #[serde(rename = "wordLimit")]
    pub word_limit: usize,
}

impl GenerationRequest {
    pub fn new(title: impl Into<String>, word_limit: usize) -> Result<Self, Error> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(Error::invalid_request("title is required"));
        }
        if word_limit == 0 {
            return Err(Error::invalid_request("wordLimit must be a positive integer"));
        }
        Ok(Self { title, word_limit })
    }
}

/// Request body as it arrives over HTTP, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationRequestBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "wordLimit")]
    pub word_limit: Option<serde_json::Value>,
}

impl TryFrom<GenerationRequestBody> for GenerationRequest {
    type Error = Error;

    fn try_from(body: GenerationRequestBody) -> Result<Self, Self::Error> {
        let title = body
            .title
            .filter(|title| !title.trim().is_empty())
            .ok_or_else(|| Error::invalid_request("missing required field: title"))?;

        let word_limit = match body.word_limit {
            None | Some(serde_json::Value::Null) => {
                return Err(Error::invalid_request("missing required field: wordLimit"))
            }
            Some(value) => value
                .as_u64()
                .filter(|limit| *limit > 0)
                .ok_or_else(|| Error::invalid_request("wordLimit must be a positive integer"))?,
        };

        GenerationRequest::new(title, word_limit as usize)
    }
}

/// One event of a description stream.
///
/// A stream carries zero or more `Char` events followed by exactly one
/// `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationEvent {
    Char {
        #[serde(rename = "char")]
        ch: char,
        #[serde(default, rename = "fullText")]
        full_text: String,
        #[serde(default, rename = "currentLength")]
        current_length: usize,
    },
    Done {
        done: bool,
        description: String,
    },
    Error {
        error: String,
    },
}

impl GenerationEvent {
    pub fn char(ch: char, full_text: impl Into<String>, current_length: usize) -> Self {
        GenerationEvent::Char {
            ch,
            full_text: full_text.into(),
            current_length,
        }
    }

    pub fn done(description: impl Into<String>) -> Self {
        GenerationEvent::Done {
            done: true,
            description: description.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        GenerationEvent::Error {
            error: message.into(),
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GenerationEvent::Char { .. })
    }

    /// Encode this event as a wire line, including the trailing blank line.
    pub fn to_wire(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => format!("{EVENT_PREFIX}{json}\n\n"),
            Err(e) => {
                tracing::error!("failed to encode generation event: {e}");
                format!("{EVENT_PREFIX}{{\"error\":\"encoding failure\"}}\n\n")
            }
        }
    }

    /// Decode the payload of a single event line (without the `data: ` prefix).
    pub fn from_payload(payload: &str) -> Result<Self, Error> {
        let event: GenerationEvent = serde_json::from_str(payload)
            .map_err(|e| Error::malformed_event(format!("{e}: {payload}")))?;
        match event {
            GenerationEvent::Done { done: false, .. } => Err(Error::malformed_event(format!(
                "done flag is false: {payload}"
            ))),
            event => Ok(event),
        }
    }
}
