// Transport configuration. Keys and endpoints are supplied by the caller; no
// service credentials live in this crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, TransportError};

const DEFAULT_SOCKET_URL: &str = "ws://localhost:8080";
const DEFAULT_PUSHER_CLUSTER: &str = "eu";
const DEFAULT_RECONNECT_DELAY_MS: u64 = 3_000;
const PUSHER_PROTOCOL: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay before every attempt
    #[default]
    Fixed,
    /// Delay doubles per attempt, capped at `max_delay_ms`
    Exponential { max_delay_ms: u64 },
}

/// When and how often a dropped connection is re-established
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default)]
    pub backoff: Backoff,
    /// `None` retries forever
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

fn default_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY_MS
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            backoff: Backoff::Fixed,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay_ms: delay.as_millis() as u64,
            ..Self::default()
        }
    }

    pub fn exponential(initial: Duration, max_delay: Duration) -> Self {
        Self {
            delay_ms: initial.as_millis() as u64,
            backoff: Backoff::Exponential {
                max_delay_ms: max_delay.as_millis() as u64,
            },
            max_attempts: None,
        }
    }

    /// Never reconnect
    pub fn disabled() -> Self {
        Self {
            max_attempts: Some(0),
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Whether reconnect attempt number `attempt` (1-based) may run
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt <= max)
    }

    /// Delay before reconnect attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => Duration::from_millis(self.delay_ms),
            Backoff::Exponential { max_delay_ms } => {
                let exponent = attempt.saturating_sub(1).min(16);
                let delay = self.delay_ms.saturating_mul(1u64 << exponent);
                Duration::from_millis(delay.min(max_delay_ms.max(self.delay_ms)))
            }
        }
    }
}

/// Raw JSON socket endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketConfig {
    #[serde(default = "default_socket_url")]
    pub url: String,
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

fn default_socket_url() -> String {
    DEFAULT_SOCKET_URL.to_string()
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            url: default_socket_url(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl SocketConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_ws_url(&self.url)
    }
}

/// Pusher Channels application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PusherConfig {
    #[serde(default)]
    pub key: String,
    #[serde(default = "default_cluster")]
    pub cluster: String,
    #[serde(default = "default_true")]
    pub force_tls: bool,
    /// Overrides `ws-{cluster}.pusher.com`, e.g. for a self-hosted server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

fn default_cluster() -> String {
    DEFAULT_PUSHER_CLUSTER.to_string()
}

fn default_true() -> bool {
    true
}

impl PusherConfig {
    pub fn new(key: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            cluster: cluster.into(),
            force_tls: true,
            host: None,
            port: None,
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    pub fn with_tls(mut self, force_tls: bool) -> Self {
        self.force_tls = force_tls;
        self
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// WebSocket URL of the application endpoint
    pub fn url(&self) -> String {
        let scheme = if self.force_tls { "wss" } else { "ws" };
        let host = self
            .host
            .clone()
            .unwrap_or_else(|| format!("ws-{}.pusher.com", self.cluster));
        let port = self.port.unwrap_or(if self.force_tls { 443 } else { 80 });
        format!(
            "{}://{}:{}/app/{}?protocol={}&client=attend-rs&version={}&flash=false",
            scheme,
            host,
            port,
            self.key,
            PUSHER_PROTOCOL,
            env!("CARGO_PKG_VERSION")
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(TransportError::InvalidConfig("pusher key is required".to_string()));
        }
        if self.host.is_none() && self.cluster.trim().is_empty() {
            return Err(TransportError::InvalidConfig(
                "pusher cluster or host is required".to_string(),
            ));
        }
        validate_ws_url(&self.url())
    }
}

fn validate_ws_url(raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| TransportError::InvalidConfig(format!("url '{}': {}", raw, e)))?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(TransportError::InvalidConfig(format!(
            "url must use ws or wss, got '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_fixed_three_seconds_forever() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(3));
        assert_eq!(policy.delay_for(50), Duration::from_secs(3));
        assert!(policy.allows(10_000));
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let policy = ReconnectPolicy::exponential(Duration::from_millis(500), Duration::from_secs(4));
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_secs(1));
        assert_eq!(policy.delay_for(4), Duration::from_secs(4));
        assert_eq!(policy.delay_for(30), Duration::from_secs(4));
    }

    #[test]
    fn test_max_attempts() {
        let policy = ReconnectPolicy::default().with_max_attempts(2);
        assert!(policy.allows(2));
        assert!(!policy.allows(3));
        assert!(!ReconnectPolicy::disabled().allows(1));
    }

    #[test]
    fn test_pusher_url() {
        let config = PusherConfig::new("app-key", "eu");
        assert_eq!(
            config.url(),
            format!(
                "wss://ws-eu.pusher.com:443/app/app-key?protocol=7&client=attend-rs&version={}&flash=false",
                env!("CARGO_PKG_VERSION")
            )
        );

        let local = PusherConfig::new("k", "mt1").with_host("127.0.0.1", 6001).with_tls(false);
        assert!(local.url().starts_with("ws://127.0.0.1:6001/app/k?"));
    }

    #[test]
    fn test_pusher_requires_key() {
        assert!(PusherConfig::new("", "eu").validate().is_err());
        assert!(PusherConfig::new("k", "eu").validate().is_ok());
    }

    #[test]
    fn test_socket_url_scheme() {
        assert!(SocketConfig::default().validate().is_ok());
        assert!(SocketConfig::new("http://localhost:8080").validate().is_err());
    }

    #[test]
    fn test_policy_deserialize() {
        let policy: ReconnectPolicy = serde_json::from_str(
            r#"{"delay_ms":1000,"backoff":{"kind":"exponential","max_delay_ms":30000},"max_attempts":10}"#,
        )
        .unwrap();
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert!(!policy.allows(11));
    }
}
