// Connection settings for the REST backend. Passed explicitly at construction
// so that each environment (local, staging, production, tests) builds its own.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PER_PAGE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL including the API prefix, e.g. `https://agent.example.com/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Page size used when loading conversation history
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            per_page: DEFAULT_PER_PAGE,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidConfig(format!("base_url '{}': {}", self.base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "base_url must use http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if self.per_page == 0 {
            return Err(ClientError::InvalidConfig("per_page must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    per_page: Option<u32>,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let config = ClientConfig {
            base_url: self.base_url.unwrap_or_else(default_base_url),
            timeout_secs: self.timeout.map_or(DEFAULT_TIMEOUT_SECS, |t| t.as_secs().max(1)),
            per_page: self.per_page.unwrap_or(DEFAULT_PER_PAGE),
            user_agent: self.user_agent,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let result = ClientConfig::builder().base_url("not a url").build();
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));

        let result = ClientConfig::builder().base_url("ftp://example.com").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_zero_page_size() {
        let result = ClientConfig::builder().per_page(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_deserialize() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"https://agent.example.com/api"}"#).unwrap();
        assert_eq!(config.per_page, 50);
        assert_eq!(config.timeout_secs, 30);
    }
}
