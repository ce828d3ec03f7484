use attend_types::{BotConfig, BotConfigUpdate};
use reqwest::Method;

use crate::client::AttendClient;
use crate::error::Result;

pub struct BotConfigEndpoints<'a> {
    client: &'a AttendClient,
}

impl<'a> BotConfigEndpoints<'a> {
    pub(crate) fn new(client: &'a AttendClient) -> Self {
        Self { client }
    }

    pub async fn get(&self) -> Result<BotConfig> {
        self.client.get("bot-config", None::<&()>).await
    }

    pub async fn update(&self, update: &BotConfigUpdate) -> Result<BotConfig> {
        tracing::info!(
            system_prompt = update.system_prompt.is_some(),
            context_data = update.context_data.is_some(),
            personality = update.personality.is_some(),
            "Updating bot configuration"
        );
        self.client.send(Method::PUT, "bot-config", Some(update)).await
    }

    /// Restore the backend's default configuration
    pub async fn reset(&self) -> Result<BotConfig> {
        tracing::info!("Resetting bot configuration");
        self.client.send(Method::POST, "bot-config/reset", None::<&()>).await
    }
}
