use crate::config::Secret;
use crate::error::ResqError;
use serde::Deserialize;
use std::path::Path;
use url::Url;

/// Model server parameters, as declared in the model YAML (rename the
/// checked-in `model.yaml.example`):
///
/// ```yaml
/// endpoint: "http://127.0.0.1:8080"
/// model: "Code-Llama-3-8B-Q6_K"
/// temperature: 0.2
/// max_tokens: 512
/// n_ctx: 3000
/// timeout_secs: 120
/// retries: 3
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the local model server.
    pub endpoint: Url,
    /// Model identifier forwarded to the server; llama.cpp serves a single
    /// model and ignores it, other backends route on it.
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Context window the prompt must fit into (the llama.cpp `n_ctx`).
    pub n_ctx: usize,
    pub timeout_secs: u64,
    /// Retry attempts for transport failures and 5xx responses.
    pub retries: usize,
    /// Bearer token, for servers started with an API key.
    pub api_key: Option<Secret>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse("http://127.0.0.1:8080").expect("static URL"),
            model: "Code-Llama-3-8B-Q6_K".to_string(),
            temperature: 0.2,
            max_tokens: 512,
            n_ctx: 3000,
            timeout_secs: 120,
            retries: 3,
            api_key: None,
        }
    }
}

impl ModelConfig {
    pub fn from_path(path: &Path) -> Result<Self, ResqError> {
        if !path.exists() {
            return Err(ResqError::ConfigNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents).map_err(|e| match e {
            ResqError::ConfigParse { source, .. } => ResqError::ConfigParse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ResqError> {
        serde_yaml::from_str(contents).map_err(|source| ResqError::ConfigParse {
            path: "<inline>".into(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_local_llama_server() {
        let cfg = ModelConfig::default();
        assert_eq!(cfg.endpoint.as_str(), "http://127.0.0.1:8080/");
        assert_eq!(cfg.n_ctx, 3000);
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg =
            ModelConfig::from_yaml_str("endpoint: \"http://10.0.0.2:9090\"\ntemperature: 0.0\n")
                .unwrap();
        assert_eq!(cfg.endpoint.as_str(), "http://10.0.0.2:9090/");
        assert_eq!(cfg.temperature, 0.0);
        assert_eq!(cfg.max_tokens, 512);
    }
}
