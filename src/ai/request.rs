//! Chat-completion request payload

use serde::{Deserialize, Serialize};

use crate::core::ModelParams;
use crate::prompt::render_prompt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub frequency_penalty: f64,
    pub n: u32,
}

/// Single user message, non-streaming, one completion.
#[must_use]
pub fn build_request(params: &ModelParams, source: &str) -> ChatRequest {
    ChatRequest {
        model: params.model.clone(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: render_prompt(source),
        }],
        stream: false,
        max_tokens: params.max_tokens,
        stop: Vec::new(),
        temperature: params.temperature,
        top_p: params.top_p,
        top_k: params.top_k,
        frequency_penalty: params.frequency_penalty,
        n: 1,
    }
}
