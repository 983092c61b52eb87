use serde::{Deserialize, Serialize};

/// One single-shot request against the Anthropic Messages API.
///
/// See [messages](https://docs.anthropic.com/en/api/messages) for the full
/// field set; only the fields this crate sends are modeled.
#[derive(Clone, Serialize, Debug)]
pub struct AnthropicCompletionRequest {
    /// ID of the model to use.
    pub model: String,

    /// Input messages. This crate always sends a single user turn.
    pub messages: Vec<CompletionRequestMessage>,

    /// The maximum number of tokens to generate before stopping.
    pub max_tokens: u64,

    /// Amount of randomness injected into the response. Ranges from 0.0 to
    /// 1.0; values near 0.0 bias toward deterministic, literal answers.
    pub temperature: f32,

    /// System prompt, unused by the classification workflow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CompletionRequestMessage {
    pub role: String,
    pub content: String,
}

impl CompletionRequestMessage {
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnthropicCompletionResponse {
    pub id: String,
    pub model: String,
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl AnthropicCompletionResponse {
    /// The concatenated text of all text content blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
