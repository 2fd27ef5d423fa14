//! Configuration for CompatBrain.

use brain_core::BrainError;
use std::env;

/// Default request timeout for alternate providers.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for one named OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct CompatBrainConfig {
    /// Provider name used for dispatch (lowercase, e.g. "grok").
    pub name: String,

    /// Base API URL (the adapter appends `/v1/chat/completions`).
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Maximum tokens for response.
    pub max_tokens: Option<u32>,

    /// Temperature for generation (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CompatBrainConfig {
    fn default() -> Self {
        Self {
            name: "openai".to_string(),
            api_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: Some(2048),
            temperature: Some(0.7),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Known base URL and default model for common provider names.
fn known_defaults(name: &str) -> Option<(&'static str, &'static str)> {
    match name {
        "grok" | "xai" => Some(("https://api.x.ai", "grok-4-1-fast")),
        "openai" => Some(("https://api.openai.com", "gpt-4o-mini")),
        "deepseek" => Some(("https://api.deepseek.com", "deepseek-chat")),
        "groq" => Some(("https://api.groq.com/openai", "llama-3.3-70b-versatile")),
        "mistral" => Some(("https://api.mistral.ai", "mistral-small-latest")),
        _ => None,
    }
}

impl CompatBrainConfig {
    /// Create configuration for a named provider from environment variables.
    ///
    /// The provider name is upper-cased to form the variable prefix.
    ///
    /// Required environment variables:
    /// - `<NAME>_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `<NAME>_API_URL` - Base URL (default: known URL for the name)
    /// - `<NAME>_MODEL` - Model name (default: known model for the name)
    /// - `<NAME>_MAX_TOKENS` - Max tokens (default: 2048)
    /// - `<NAME>_TEMPERATURE` - Temperature (default: 0.7)
    /// - `<NAME>_TIMEOUT_SECS` - Request timeout (default: 60)
    ///
    /// Unknown provider names must set both `_API_URL` and `_MODEL`.
    pub fn from_env(name: &str) -> Result<Self, BrainError> {
        let name = name.trim().to_ascii_lowercase();
        let prefix = name.to_ascii_uppercase().replace('-', "_");
        let var = |suffix: &str| env::var(format!("{}_{}", prefix, suffix)).ok();

        let api_key = var("API_KEY").ok_or_else(|| {
            BrainError::Configuration(format!("{}_API_KEY not set", prefix))
        })?;

        let defaults = known_defaults(&name);

        let api_url = var("API_URL")
            .or_else(|| defaults.map(|(url, _)| url.to_string()))
            .ok_or_else(|| BrainError::Configuration(format!("{}_API_URL not set", prefix)))?;

        let model = var("MODEL")
            .or_else(|| defaults.map(|(_, model)| model.to_string()))
            .ok_or_else(|| BrainError::Configuration(format!("{}_MODEL not set", prefix)))?;

        let max_tokens = var("MAX_TOKENS")
            .and_then(|v| v.parse().ok())
            .or(Some(2048));

        let temperature = var("TEMPERATURE")
            .and_then(|v| v.parse().ok())
            .or(Some(0.7));

        let timeout_secs = var("TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            name,
            api_url,
            api_key,
            model,
            max_tokens,
            temperature,
            timeout_secs,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> CompatBrainConfigBuilder {
        CompatBrainConfigBuilder::default()
    }
}

/// Names listed in `ALTERNATE_PROVIDERS` (comma-separated, lowercased).
pub fn provider_names_from_env() -> Vec<String> {
    env::var("ALTERNATE_PROVIDERS")
        .map(|raw| parse_provider_list(&raw))
        .unwrap_or_default()
}

fn parse_provider_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Builder for CompatBrainConfig.
#[derive(Debug, Default)]
pub struct CompatBrainConfigBuilder {
    config: CompatBrainConfig,
}

impl CompatBrainConfigBuilder {
    /// Set the provider name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into().to_ascii_lowercase();
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set the request timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> CompatBrainConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompatBrainConfig::default();
        assert_eq!(config.name, "openai");
        assert_eq!(config.api_url, "https://api.openai.com");
        assert!(config.api_key.is_empty());
        assert_eq!(config.max_tokens, Some(2048));
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_builder_lowercases_name() {
        let config = CompatBrainConfig::builder()
            .name("DeepSeek")
            .api_key("k")
            .model("deepseek-chat")
            .build();
        assert_eq!(config.name, "deepseek");
        assert_eq!(config.model, "deepseek-chat");
    }

    #[test]
    fn test_parse_provider_list() {
        assert_eq!(
            parse_provider_list(" Grok, openai ,,deepseek "),
            vec!["grok", "openai", "deepseek"]
        );
        assert!(parse_provider_list("").is_empty());
    }

    // Environment-based tests are combined into a single test to avoid
    // race conditions when tests run in parallel (env vars are process-global).
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear(prefix: &str) {
            for suffix in ["API_KEY", "API_URL", "MODEL", "MAX_TOKENS", "TEMPERATURE", "TIMEOUT_SECS"] {
                std::env::remove_var(format!("{}_{}", prefix, suffix));
            }
        }

        // Missing key errors with the prefixed variable name
        clear("GROK");
        match CompatBrainConfig::from_env("grok") {
            Err(BrainError::Configuration(msg)) => assert!(msg.contains("GROK_API_KEY")),
            other => panic!("Expected Configuration error, got {:?}", other),
        }

        // Known provider fills in URL and model
        clear("GROK");
        std::env::set_var("GROK_API_KEY", "xai-key");
        let config = CompatBrainConfig::from_env("Grok").unwrap();
        assert_eq!(config.name, "grok");
        assert_eq!(config.api_url, "https://api.x.ai");
        assert_eq!(config.model, "grok-4-1-fast");

        // Unknown provider requires an explicit URL
        clear("LOCALLLM");
        std::env::set_var("LOCALLLM_API_KEY", "k");
        assert!(CompatBrainConfig::from_env("localllm").is_err());
        std::env::set_var("LOCALLLM_API_URL", "http://127.0.0.1:8000");
        std::env::set_var("LOCALLLM_MODEL", "qwen");
        std::env::set_var("LOCALLLM_TEMPERATURE", "0.2");
        let config = CompatBrainConfig::from_env("localllm").unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:8000");
        assert_eq!(config.temperature, Some(0.2));

        clear("GROK");
        clear("LOCALLLM");
    }
}
