use super::{
    config::ApiConfigTrait,
    error::{map_deserialization_error, map_serialization_error, ClientError, WrappedError},
};
use serde::{de::DeserializeOwned, Serialize};

/// Timeout owned by the transport layer; a call either completes or fails
/// within this window. Failed calls are not retried (the caller degrades the
/// result instead), so one request bounds the per-item wall-clock cost.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

#[derive(Debug, Clone)]
pub(crate) struct ApiClient<C: ApiConfigTrait> {
    http_client: reqwest::Client,
    pub config: C,
}

impl<C: ApiConfigTrait> ApiClient<C> {
    pub fn new(config: C) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
        }
    }

    /// Make a POST request to {path} and deserialize the response body
    pub(crate) async fn post<I, O>(&self, path: &str, request: I) -> Result<O, ClientError>
    where
        I: Serialize + std::fmt::Debug,
        O: DeserializeOwned,
    {
        let serialized_request =
            serde_json::to_string(&request).map_err(map_serialization_error)?;
        crate::trace!("Serialized request: {}", serialized_request);
        let request = self
            .http_client
            .post(self.config.url(path))
            .headers(self.config.headers())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(serialized_request)
            .build()?;
        self.execute(request).await
    }

    /// Execute a HTTP request, deserializing the body from either the API's
    /// error envelope or the actual response object. Single attempt only.
    async fn execute<O>(&self, request: reqwest::Request) -> Result<O, ClientError>
    where
        O: DeserializeOwned,
    {
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(ClientError::Reqwest)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(ClientError::Reqwest)?;

        if !status.is_success() {
            let wrapped_error: WrappedError = serde_json::from_slice(bytes.as_ref())
                .map_err(|e| map_deserialization_error(e, bytes.as_ref()))?;
            return Err(ClientError::ApiError(wrapped_error.error));
        }

        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| map_deserialization_error(e, &bytes))?;
        crate::trace!("Serialized response: {}", value);

        let response: O =
            serde_json::from_value(value).map_err(|e| map_deserialization_error(e, &bytes))?;

        Ok(response)
    }
}
