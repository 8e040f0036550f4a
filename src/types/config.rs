use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::message::Message;

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(alias = "prompt_tokens")]
    pub input_tokens: u32,
    #[serde(alias = "completion_tokens")]
    pub output_tokens: u32,
}

/// Provider-neutral chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

/// Fixed sampling parameters and pacing for description generation.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// Delay between two character events.
    pub pacing: Duration,
    /// Capacity of the event channel between generator and HTTP body.
    pub channel_capacity: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "Qwen/Qwen2.5-VL-7B-Instruct:hyperbolic".to_string(),
            max_tokens: 10_000,
            temperature: 0.6,
            top_p: 0.9,
            pacing: Duration::from_millis(50),
            channel_capacity: 64,
        }
    }
}

impl GenerationSettings {
    /// Build the chat request for a single prompt.
    pub fn chat_request(&self, prompt: impl Into<String>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            top_p: Some(self.top_p),
        }
    }
}
