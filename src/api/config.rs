use reqwest::header::HeaderMap;
use secrecy::Secret;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub host: String,
    pub api_key: Option<Secret<String>>,
    pub api_key_env_var: String,
}

impl ApiConfig {
    pub(crate) fn load_api_key(&mut self) -> crate::Result<Secret<String>> {
        if let Some(api_key) = self.api_key.as_ref() {
            crate::trace!("Using api_key from parameter");
            return Ok(api_key.to_owned());
        }
        crate::trace!("api_key not set. Attempting to load from .env");
        dotenvy::dotenv().ok();

        match dotenvy::var(&self.api_key_env_var) {
            Ok(api_key) => {
                crate::trace!("Successfully loaded api_key from .env");
                Ok(api_key.into())
            }
            Err(_) => {
                crate::trace!(
                    "{} not found in dotenv, nor was it set manually",
                    self.api_key_env_var
                );
                crate::bail!(
                    "Failed to load api_key from parameter or the {} env var",
                    self.api_key_env_var
                )
            }
        }
    }
}

pub(crate) trait ApiConfigTrait {
    fn headers(&self) -> HeaderMap;

    fn url(&self, path: &str) -> String;

    fn api_key(&self) -> &Option<Secret<String>>;
}
