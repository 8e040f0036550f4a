#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use todo_assist::server::{self, AppState};
use todo_assist::{DescriptionGenerator, GenerationSettings, OpenAIProvider};

/// Render content fragments as a Chat Completions SSE body.
pub fn chat_stream_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        let chunk = json!({
            "id": "chatcmpl-test",
            "object": "chat.completion.chunk",
            "choices": [{ "index": 0, "delta": { "content": fragment }, "finish_reason": null }]
        });
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    let last = json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "choices": [{ "index": 0, "delta": {}, "finish_reason": "stop" }],
        "usage": { "prompt_tokens": 42, "completion_tokens": fragments.len() }
    });
    body.push_str(&format!("data: {last}\n\n"));
    body.push_str("data: [DONE]\n\n");
    body
}

/// Mount a streamed chat completion answering with `fragments`.
pub async fn mount_chat_stream(server: &MockServer, fragments: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(chat_stream_body(fragments)),
        )
        .mount(server)
        .await;
}

pub fn generation_state(provider_url: &str) -> AppState {
    let provider = OpenAIProvider::new_with_base_url("test-api-key".to_string(), provider_url.to_string())
        .expect("Failed to create OpenAI provider");
    let settings = GenerationSettings {
        pacing: Duration::ZERO,
        ..GenerationSettings::default()
    };
    AppState::new(Arc::new(DescriptionGenerator::new(Arc::new(provider), settings)))
}

/// A running server on an ephemeral port. Dropping it stops the server.
pub struct TestApp {
    pub base_url: String,
    _shutdown: oneshot::Sender<()>,
}

pub async fn spawn_app(state: AppState) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown, stopped) = oneshot::channel::<()>();

    tokio::spawn(server::serve(listener, state, async move {
        let _ = stopped.await;
    }));

    TestApp {
        base_url: format!("http://{addr}"),
        _shutdown: shutdown,
    }
}
