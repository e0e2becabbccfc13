//! Runtime configuration for vllm-gateway.
//!
//! Configuration is resolved once at process start (environment variables
//! plus CLI flags) and injected into the handler state; request handling
//! never consults the environment.

use std::env;

use clap::Parser;

/// Environment variable naming the vLLM backend base URL.
pub const LLM_ENDPOINT_ENV: &str = "vLLM_LLM_ENDPOINT";

/// Environment variable naming the model served by the backend.
pub const MODEL_ID_ENV: &str = "LLM_MODEL_ID";

const DEFAULT_LLM_ENDPOINT: &str = "http://localhost:8080";
const DEFAULT_MODEL_ID: &str = "meta-llama/Meta-Llama-3-8B-Instruct";

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "vllm-gateway", about = "Chat-completion gateway for a vLLM backend")]
pub struct Cli {
    /// HTTP listen address.
    #[arg(long, default_value = "0.0.0.0:9000")]
    pub listen: String,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the vLLM backend (no `/v1` suffix).
    pub llm_endpoint: String,

    /// Model identifier passed through to the backend.
    pub model_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
        }
    }
}

impl Config {
    /// Resolve configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            llm_endpoint: env::var(LLM_ENDPOINT_ENV)
                .unwrap_or_else(|_| DEFAULT_LLM_ENDPOINT.to_string()),
            model_id: env::var(MODEL_ID_ENV).unwrap_or_else(|_| DEFAULT_MODEL_ID.to_string()),
        }
    }

    /// OpenAI-compatible API root on the backend.
    pub fn api_base(&self) -> String {
        format!("{}/v1", self.llm_endpoint.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.api_base(), "http://localhost:8080/v1");
        assert_eq!(cfg.model_id, "meta-llama/Meta-Llama-3-8B-Instruct");
    }

    #[test]
    fn test_api_base_normalizes_trailing_slash() {
        let cfg = Config {
            llm_endpoint: "http://vllm:8000/".to_string(),
            ..Config::default()
        };
        assert_eq!(cfg.api_base(), "http://vllm:8000/v1");
    }

    #[test]
    fn test_env_overrides() {
        env::set_var(LLM_ENDPOINT_ENV, "http://inference:8000");
        env::set_var(MODEL_ID_ENV, "mistralai/Mistral-7B-Instruct-v0.3");

        let cfg = Config::from_env();
        assert_eq!(cfg.api_base(), "http://inference:8000/v1");
        assert_eq!(cfg.model_id, "mistralai/Mistral-7B-Instruct-v0.3");

        env::remove_var(LLM_ENDPOINT_ENV);
        env::remove_var(MODEL_ID_ENV);
    }
}
