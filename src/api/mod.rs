pub mod client;
pub mod completion;
pub mod config;
pub mod error;

use client::ApiClient;
use completion::{AnthropicCompletionRequest, AnthropicCompletionResponse};
use config::{ApiConfig, ApiConfigTrait};
use error::ClientError;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, Secret};

/// Default v1 API base url
pub const ANTHROPIC_API_HOST: &str = "api.anthropic.com/v1";
/// Required version header
pub const ANTHROPIC_VERSION_HEADER: &str = "anthropic-version";

pub struct AnthropicBackend {
    client: ApiClient<AnthropicConfig>,
    /// ID of the model completions are requested from.
    pub model_id: String,
    /// Upper bound on generated tokens per completion.
    pub max_tokens: u64,
    /// Sampling temperature, 0.0 to 1.0 on Anthropic's native scale.
    pub temperature: f32,
}

impl AnthropicBackend {
    pub fn new(mut config: AnthropicConfig) -> crate::Result<Self> {
        config.api_config.api_key = Some(config.api_config.load_api_key()?);
        let model_id = config.model_id.clone();
        let max_tokens = config.max_tokens;
        let temperature = config.temperature;
        Ok(Self {
            client: ApiClient::new(config),
            model_id,
            max_tokens,
            temperature,
        })
    }

    /// Request a single text completion for `prompt` and return the generated
    /// text. The sole point of contact with the remote model.
    pub async fn completion(&self, prompt: &str) -> Result<String, ClientError> {
        let request = AnthropicCompletionRequest {
            model: self.model_id.clone(),
            messages: vec![completion::CompletionRequestMessage::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: None,
        };
        let res: AnthropicCompletionResponse = self.client.post("/messages", request).await?;
        crate::debug!(
            id = %res.id,
            model = %res.model,
            stop_reason = ?res.stop_reason,
            "completion response received"
        );
        let text = res.text();
        if text.is_empty() {
            return Err(ClientError::ResponseContentEmpty);
        }
        Ok(text)
    }
}

#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    pub api_config: ApiConfig,
    pub anthropic_version: String,
    pub model_id: String,
    pub max_tokens: u64,
    pub temperature: f32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_config: ApiConfig {
                host: ANTHROPIC_API_HOST.to_string(),
                api_key: None,
                api_key_env_var: "ANTHROPIC_API_KEY".to_string(),
            },
            anthropic_version: "2023-06-01".to_string(),
            model_id: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 1000,
            temperature: 0.1,
        }
    }
}

impl AnthropicConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_model_id<S: Into<String>>(mut self, model_id: S) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_config.api_key = Some(Secret::from(api_key.into()));
        self
    }

    pub fn with_api_host<S: Into<String>>(mut self, host: S) -> Self {
        self.api_config.host = host.into();
        self
    }
}

impl ApiConfigTrait for AnthropicConfig {
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ANTHROPIC_VERSION_HEADER,
            self.anthropic_version.as_str().parse().unwrap(),
        );

        if let Some(api_key) = self.api_key() {
            headers.insert(
                reqwest::header::HeaderName::from_static("x-api-key"),
                reqwest::header::HeaderValue::from_str(api_key.expose_secret()).unwrap(),
            );
        }

        headers
    }

    fn url(&self, path: &str) -> String {
        format!("https://{}{}", self.api_config.host, path)
    }

    fn api_key(&self) -> &Option<Secret<String>> {
        &self.api_config.api_key
    }
}
