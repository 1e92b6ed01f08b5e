use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
/// Output cap sent with every request; the only bound on response size.
pub const DEFAULT_MAX_TOKENS: u64 = 1500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub api_base: String,
    pub model: String,
    pub max_tokens: u64,
    /// `None` waits until the remote side answers or the connection fails.
    pub timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: first_non_empty_env(&["RXLENS_API_BASE", "OPENAI_API_BASE"])
                .map(|raw| normalize_api_base(&raw))
                .unwrap_or(defaults.api_base),
            model: first_non_empty_env(&["RXLENS_MODEL"]).unwrap_or(defaults.model),
            max_tokens: first_non_empty_env(&["RXLENS_MAX_TOKENS"])
                .and_then(|raw| raw.parse::<u64>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(defaults.max_tokens),
            timeout: first_non_empty_env(&["RXLENS_TIMEOUT_SECS"])
                .and_then(|raw| raw.parse::<f64>().ok())
                .filter(|secs| secs.is_finite() && *secs > 0.0)
                .map(Duration::from_secs_f64),
        }
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = normalize_api_base(api_base);
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

fn first_non_empty_env(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(value) = env::var(key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

fn normalize_api_base(raw: &str) -> String {
    let mut base = raw.trim().trim_end_matches('/').to_string();
    if let Ok(parsed) = reqwest::Url::parse(&base) {
        if parsed.path().trim().is_empty() || parsed.path() == "/" {
            base = format!("{base}/v1");
        }
    }
    base.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::{normalize_api_base, EngineConfig, DEFAULT_MAX_TOKENS};

    #[test]
    fn default_endpoint_is_chat_completions() {
        let config = EngineConfig::default();
        assert_eq!(
            config.endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn api_base_gets_version_segment_when_bare() {
        assert_eq!(
            normalize_api_base("http://127.0.0.1:8080/"),
            "http://127.0.0.1:8080/v1"
        );
        assert_eq!(
            normalize_api_base("https://proxy.local/openai/v1/"),
            "https://proxy.local/openai/v1"
        );
    }
}
