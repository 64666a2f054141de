use crate::error::ResqError;
use crate::llm::config::ModelConfig;
use crate::llm::types::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat};
use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;
use tracing::error;
use url::Url;

/// HTTP client for the local model server.
pub struct LlmClient {
    http: reqwest::Client,
    chat_url: Url,
    health_url: Url,
    config: ModelConfig,
}

impl LlmClient {
    pub fn new(config: ModelConfig) -> Result<Self, ResqError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("resq/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let chat_url = config.endpoint.join("v1/chat/completions")?;
        let health_url = config.endpoint.join("health")?;
        Ok(Self {
            http,
            chat_url,
            health_url,
            config,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn retry_policy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(3))
            .with_max_times(self.config.retries)
            .with_jitter()
    }

    /// Request a completion constrained to the `{"sql_query"}` shape and
    /// return its raw content. Transport failures and 5xx responses retry
    /// with backoff; anything else fails fast.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ResqError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: ResponseFormat::sql_answer(),
        };

        let resp = (|| async {
            let mut req = self.http.post(self.chat_url.clone()).json(&body);
            if let Some(key) = self.config.api_key.as_ref() {
                req = req.bearer_auth(key.expose());
            }
            let resp = req.send().await?;
            if resp.status().is_server_error() {
                let status = resp.status();
                let err = resp.error_for_status().unwrap_err();
                error!("model server error (will retry): {}", status);
                return Err(err);
            }
            Ok(resp)
        })
        .retry(self.retry_policy())
        .await?;

        if !resp.status().is_success() {
            return Err(ResqError::LlmStatus(resp.status()));
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ResqError::LlmDecode("empty completion".to_string()))
    }

    /// Probe the server's liveness endpoint; used by the startup warm-up.
    pub async fn health(&self) -> Result<(), ResqError> {
        let resp = self.http.get(self.health_url.clone()).send().await?;
        if !resp.status().is_success() {
            return Err(ResqError::LlmStatus(resp.status()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_endpoint_paths() {
        let client = LlmClient::new(ModelConfig::default()).unwrap();
        assert_eq!(
            client.chat_url.as_str(),
            "http://127.0.0.1:8080/v1/chat/completions"
        );
        assert_eq!(client.health_url.as_str(), "http://127.0.0.1:8080/health");
    }
}
