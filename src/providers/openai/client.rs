use super::types::{error_message, ChatCompletionChunk, ChatCompletionRequest, ChatMessage, OpenAIError};
use crate::provider::ChatProvider;
use crate::sse_stream::SseStreamExt;
use crate::{ChatRequest, Error, FinishReason, Response, Role, StreamEvent};
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;

const PROVIDER_NAME: &str = "OpenAI";

/// Provider speaking the OpenAI Chat Completions protocol.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIProvider {
    /// Create a new provider with a custom base URL (any OpenAI-compatible router).
    pub fn new_with_base_url(api_key: String, base_url: String) -> Result<Self, Error> {
        // Only connecting is bounded; a streamed completion may legitimately run long.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Convert internal request to the Chat Completions format.
    fn convert_request(request: &ChatRequest) -> ChatCompletionRequest {
        let messages = request
            .messages
            .iter()
            .map(|message| ChatMessage {
                role: match message.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                }
                .to_string(),
                content: message.content.clone(),
            })
            .collect();

        ChatCompletionRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            stream: true,
        }
    }

    /// Convert one streamed chunk into our stream events.
    fn convert_chunk(chunk: ChatCompletionChunk) -> Result<Vec<StreamEvent>, Error> {
        if let Some(error) = chunk.error {
            return Err(Error::provider(PROVIDER_NAME, error_message(&error)));
        }

        let mut events = Vec::new();
        for choice in chunk.choices {
            if let Some(delta) = choice.delta.content {
                if !delta.is_empty() {
                    events.push(StreamEvent::ContentDelta { delta });
                }
            }
            if let Some(reason) = choice.finish_reason {
                events.push(StreamEvent::Done {
                    finish_reason: FinishReason::from_wire(&reason),
                    usage: chunk.usage.clone(),
                });
            }
        }

        Ok(events)
    }
}

#[async_trait::async_trait]
impl ChatProvider for OpenAIProvider {
    async fn stream_chat(&self, request: &ChatRequest) -> Result<Response, Error> {
        let body = Self::convert_request(request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            let message = serde_json::from_str::<OpenAIError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(Error::provider(
                PROVIDER_NAME,
                format!("API error ({status}): {message}"),
            ));
        }

        let event_stream = response
            .bytes_stream()
            .sse_events()
            .filter_map(|sse_result| async move {
                match sse_result {
                    Ok(sse_event) if sse_event.is_done() => None,
                    Ok(sse_event) => {
                        let converted = serde_json::from_str::<ChatCompletionChunk>(&sse_event.data)
                            .map_err(|e| {
                                Error::provider(
                                    PROVIDER_NAME,
                                    format!("malformed stream chunk: {e}"),
                                )
                            })
                            .and_then(OpenAIProvider::convert_chunk);
                        Some(converted)
                    }
                    Err(e) => Some(Err(e)),
                }
            })
            .map(|events_result| match events_result {
                Ok(events) => events.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            })
            .map(futures_util::stream::iter)
            .flatten();

        Ok(Response::from_stream(event_stream))
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GenerationSettings, Message};

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new_with_base_url(
            "test-key".to_string(),
            "https://router.example/v1/".to_string(),
        )
        .unwrap();
        assert_eq!(provider.base_url, "https://router.example/v1");
        assert_eq!(provider.name(), "OpenAI");
    }

    #[test]
    fn test_request_conversion() {
        let request = GenerationSettings::default().chat_request("写一段描述");

        let converted = OpenAIProvider::convert_request(&request);
        assert_eq!(converted.model, "Qwen/Qwen2.5-VL-7B-Instruct:hyperbolic");
        assert_eq!(converted.max_tokens, Some(10_000));
        assert_eq!(converted.temperature, Some(0.6));
        assert_eq!(converted.top_p, Some(0.9));
        assert!(converted.stream);
        assert_eq!(converted.messages.len(), 1);
        assert_eq!(converted.messages[0].role, "user");
        assert_eq!(converted.messages[0].content, "写一段描述");

        let with_system = ChatRequest {
            messages: vec![Message::new(Role::System, "be brief"), Message::user("hi")],
            ..request
        };
        let converted = OpenAIProvider::convert_request(&with_system);
        assert_eq!(converted.messages[0].role, "system");
    }

    #[test]
    fn test_chunk_conversion() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{"content":"你好"},"finish_reason":null}]}"#,
        )
        .unwrap();
        let events = OpenAIProvider::convert_chunk(chunk).unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], StreamEvent::ContentDelta { delta } if delta == "你好"));

        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{},"finish_reason":"length"}],
                "usage":{"prompt_tokens":12,"completion_tokens":40}}"#,
        )
        .unwrap();
        let events = OpenAIProvider::convert_chunk(chunk).unwrap();
        match &events[0] {
            StreamEvent::Done {
                finish_reason,
                usage,
            } => {
                assert_eq!(*finish_reason, FinishReason::Length);
                assert_eq!(usage.as_ref().map(|u| u.output_tokens), Some(40));
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[test]
    fn test_in_stream_error_chunk() {
        for payload in [
            r#"{"error":"model is overloaded"}"#,
            r#"{"error":{"message":"model is overloaded","type":"server_error"}}"#,
        ] {
            let chunk: ChatCompletionChunk = serde_json::from_str(payload).unwrap();
            let err = OpenAIProvider::convert_chunk(chunk).unwrap_err();
            assert!(err.to_string().contains("model is overloaded"));
        }
    }
}
