use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use jsonld::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub retry: RetryConfig,
    pub fetch: FetchConfig,
    pub browser: BrowserConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    pub deployment: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub delay_ms: u64,
    /// Ceiling for a per-request attempt override.
    pub max_request_attempts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: String,
    pub settle_ms: u64,
    pub scroll_pause_ms: u64,
    pub click_pause_ms: u64,
    pub final_settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 2000,
            max_request_attempts: 10,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: ingest::static_html::STATIC_USER_AGENT.to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            window_width: 1920,
            window_height: 1080,
            user_agent: ingest::browser::BROWSER_USER_AGENT.to_string(),
            settle_ms: 2000,
            scroll_pause_ms: 500,
            click_pause_ms: 1000,
            final_settle_ms: 3000,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Missing required environment variable {}", key))
        };

        let llm = LlmConfig {
            endpoint: required("ENDPOINT_URL")?,
            deployment: required("DEPLOYMENT_NAME")?,
            api_key: required("AZURE_OPENAI_API_KEY")?,
            api_version: required("AZURE_OPENAI_VERSION")?,
        };

        let mut retry = RetryConfig::default();
        if let Some(value) = lookup("SCHEMA_RETRIES") {
            retry.max_attempts = value
                .trim()
                .parse()
                .with_context(|| format!("SCHEMA_RETRIES is not a number: {}", value))?;
        }
        if let Some(value) = lookup("SCHEMA_RETRY_DELAY_MS") {
            retry.delay_ms = value
                .trim()
                .parse()
                .with_context(|| format!("SCHEMA_RETRY_DELAY_MS is not a number: {}", value))?;
        }
        if let Some(value) = lookup("SCHEMA_MAX_RETRIES") {
            retry.max_request_attempts = value
                .trim()
                .parse()
                .with_context(|| format!("SCHEMA_MAX_RETRIES is not a number: {}", value))?;
        }

        let mut server = ServerConfig::default();
        if let Some(addr) = lookup("BIND_ADDR") {
            server.bind_addr = addr;
        }

        Ok(Self {
            llm,
            retry,
            fetch: FetchConfig::default(),
            browser: BrowserConfig::default(),
            server,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.retry.max_attempts, self.retry.delay_ms)
    }

    pub fn ingest_config(&self) -> ingest::IngestConfig {
        ingest::IngestConfig {
            fetch: ingest::FetchConfig {
                user_agent: self.fetch.user_agent.clone(),
                timeout: Duration::from_secs(self.fetch.timeout_secs),
            },
            browser: ingest::BrowserConfig {
                window_size: (self.browser.window_width, self.browser.window_height),
                user_agent: self.browser.user_agent.clone(),
                navigation_settle: Duration::from_millis(self.browser.settle_ms),
                pacing: ingest::Pacing {
                    after_scroll: Duration::from_millis(self.browser.scroll_pause_ms),
                    after_click: Duration::from_millis(self.browser.click_pause_ms),
                },
                final_settle: Duration::from_millis(self.browser.final_settle_ms),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("ENDPOINT_URL", "https://example.openai.azure.com"),
        ("DEPLOYMENT_NAME", "gpt-4o"),
        ("AZURE_OPENAI_API_KEY", "secret"),
        ("AZURE_OPENAI_VERSION", "2024-05-01-preview"),
    ];

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.llm.deployment, "gpt-4o");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.max_request_attempts, 10);
        assert_eq!(config.retry_policy().delay(), Duration::from_secs(2));
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");

        let ingest = config.ingest_config();
        assert_eq!(ingest.fetch.timeout, Duration::from_secs(10));
        assert_eq!(ingest.browser.window_size, (1920, 1080));
        assert_eq!(ingest.browser.pacing.after_click, Duration::from_secs(1));
        assert_eq!(ingest.browser.final_settle, Duration::from_secs(3));
    }

    #[test]
    fn test_missing_variable_is_named() {
        let err = AppConfig::from_lookup(lookup_from(&REQUIRED[..3])).unwrap_err();
        assert!(err.to_string().contains("AZURE_OPENAI_VERSION"));
    }

    #[test]
    fn test_optional_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SCHEMA_RETRIES", "5"));
        pairs.push(("SCHEMA_RETRY_DELAY_MS", "0"));
        pairs.push(("SCHEMA_MAX_RETRIES", "4"));
        pairs.push(("BIND_ADDR", "127.0.0.1:8080"));

        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.retry_policy().max_attempts(), 5);
        assert_eq!(config.retry_policy().delay(), Duration::ZERO);
        assert_eq!(config.retry.max_request_attempts, 4);
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_bad_retry_count() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SCHEMA_RETRIES", "three"));
        assert!(AppConfig::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = AppConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();
        let value = serde_json::to_value(&config).unwrap();
        assert!(value["llm"].get("api_key").is_none());
    }
}
