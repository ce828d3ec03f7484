// HTTP plumbing shared by every endpoint group

use attend_types::decode_tolerant;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use crate::bot_config::BotConfigEndpoints;
use crate::chat::ChatEndpoints;
use crate::config::ClientConfig;
use crate::conversations::ConversationEndpoints;
use crate::error::{ClientError, Result};
use crate::health::HealthEndpoints;
use crate::vendors::VendorEndpoints;

/// Client for the assistant backend (HTTP direct).
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct AttendClient {
    http_client: reqwest::Client,
    base_url: String,
    config: ClientConfig,
}

impl AttendClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("attend-rs/{}", env!("CARGO_PKG_VERSION")));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&agent)
                .map_err(|_| ClientError::InvalidConfig(format!("invalid user agent: {}", agent)))?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    /// Client pointed at `base_url` with default settings
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(base_url))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn chat(&self) -> ChatEndpoints<'_> {
        ChatEndpoints::new(self)
    }

    pub fn conversations(&self) -> ConversationEndpoints<'_> {
        ConversationEndpoints::new(self)
    }

    pub fn vendors(&self) -> VendorEndpoints<'_> {
        VendorEndpoints::new(self)
    }

    pub fn bot_config(&self) -> BotConfigEndpoints<'_> {
        BotConfigEndpoints::new(self)
    }

    pub fn health(&self) -> HealthEndpoints<'_> {
        HealthEndpoints::new(self)
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET returning the raw JSON body
    pub(crate) async fn get_value<Q>(&self, path: &str, query: Option<&Q>) -> Result<Value>
    where
        Q: Serialize + ?Sized,
    {
        let mut builder = self.http_client.get(self.url(path));
        if let Some(query) = query {
            builder = builder.query(query);
        }
        self.execute(Method::GET, path, builder).await
    }

    /// Request with an optional JSON body, returning the raw JSON body
    pub(crate) async fn send_value<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self.http_client.request(method.clone(), self.url(path));
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(method, path, builder).await
    }

    pub(crate) async fn get<T, Q>(&self, path: &str, query: Option<&Q>) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let value = self.get_value(path, query).await?;
        Ok(decode_tolerant(value)?)
    }

    pub(crate) async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let value = self.send_value(method, path, body).await?;
        Ok(decode_tolerant(value)?)
    }

    async fn execute(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<Value> {
        let start = Instant::now();

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(method = %method, path = %path, error = %e, "Request failed");
            ClientError::Network(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = %start.elapsed().as_millis(),
            "Backend call completed"
        );

        if !status.is_success() {
            tracing::warn!(method = %method, path = %path, status = %status, "Backend returned error status");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = AttendClient::with_base_url("http://localhost:8000/api/").unwrap();
        assert_eq!(client.url("/health"), "http://localhost:8000/api/health");
        assert_eq!(client.url("vendors/3"), "http://localhost:8000/api/vendors/3");
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = AttendClient::with_base_url("localhost");
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
    }
}
