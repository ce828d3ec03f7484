use attend_client::ClientConfig;
use attend_realtime::{PusherConfig, ReconnectPolicy, SocketConfig};
use attend_sync::SessionConfig;
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ClientConfig,
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub health: HealthConfig,
    pub user: UserConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Raw JSON socket, paired with the `/conversations` endpoints
    Socket,
    /// Pusher channels, paired with the `/chat` endpoints
    Pusher,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    pub transport: TransportKind,
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
    #[serde(default)]
    pub socket: SocketSection,
    #[serde(default)]
    pub pusher: PusherSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SocketSection {
    pub url: String,
}

impl Default for SocketSection {
    fn default() -> Self {
        Self {
            url: SocketConfig::default().url,
        }
    }
}

/// Pusher settings other than the key, which is a secret
#[derive(Debug, Clone, Deserialize)]
pub struct PusherSection {
    #[serde(default = "default_cluster")]
    pub cluster: String,
    #[serde(default = "default_true")]
    pub force_tls: bool,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

fn default_cluster() -> String {
    "eu".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PusherSection {
    fn default() -> Self {
        Self {
            cluster: default_cluster(),
            force_tls: true,
            host: None,
            port: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_health_interval")]
    pub interval_secs: u64,
}

fn default_health_interval() -> u64 {
    30
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_health_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl RealtimeConfig {
    pub fn socket_config(&self) -> SocketConfig {
        SocketConfig::new(self.socket.url.clone()).with_reconnect(self.reconnect)
    }

    /// Pusher settings completed with the key from the environment
    pub fn pusher_config(&self, key: &str) -> PusherConfig {
        let mut config = PusherConfig::new(key, self.pusher.cluster.clone())
            .with_tls(self.pusher.force_tls)
            .with_reconnect(self.reconnect);
        config.host = self.pusher.host.clone();
        config.port = self.pusher.port;
        config
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables prefixed with ATTEND_, nested keys joined by
    ///    `__` (e.g. `ATTEND_API__BASE_URL`, `ATTEND_REALTIME__TRANSPORT`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("ATTEND")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// The Pusher key is only read from the environment
    pub fn pusher_key() -> Result<String, ConfigError> {
        std::env::var("PUSHER_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::Message("PUSHER_KEY environment variable is required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attend_sync::{IntakePolicy, SendRoute};

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [api]
            base_url = "http://127.0.0.1:8000/api"
            timeout_secs = 10
            per_page = 20

            [realtime]
            transport = "pusher"

            [realtime.reconnect]
            delay_ms = 1000
            max_attempts = 5

            [realtime.pusher]
            cluster = "mt1"
            force_tls = false
            host = "127.0.0.1"
            port = 6001

            [session]
            intake = "assistant_only"
            route = "rest"

            [health]
            interval_secs = 15

            [user]
            id = "user123"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api.per_page, 20);
        assert_eq!(config.realtime.transport, TransportKind::Pusher);
        assert_eq!(config.realtime.reconnect.max_attempts, Some(5));
        assert_eq!(config.session.intake, IntakePolicy::AssistantOnly);
        assert_eq!(config.session.route, SendRoute::Rest);
        assert_eq!(config.health.interval_secs, 15);
        assert!(config.health.enabled);

        let pusher = config.realtime.pusher_config("key");
        assert!(pusher.url().starts_with("ws://127.0.0.1:6001/app/key?"));
    }

    #[test]
    fn test_sections_have_defaults() {
        let toml = r#"
            [api]
            [realtime]
            transport = "socket"
            [user]
            id = "u1"
            [logging]
            level = "info"
            format = "pretty"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.realtime.socket_config().url, "ws://localhost:8080");
        assert_eq!(config.realtime.reconnect, ReconnectPolicy::default());
        assert_eq!(config.health.interval_secs, 30);
    }
}
