use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Assistant configuration served by `/bot-config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub context_data: Vec<String>,
    /// Free-form: the backend stores either a list of traits or an object
    #[serde(default)]
    pub personality: Value,
}

/// Partial update for `PUT /bot-config`; unset fields are left untouched
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BotConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_data: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<Vec<String>>,
}

impl BotConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn context_data(mut self, data: Vec<String>) -> Self {
        self.context_data = Some(data);
        self
    }

    pub fn personality(mut self, traits: Vec<String>) -> Self {
        self.personality = Some(traits);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.system_prompt.is_none() && self.context_data.is_none() && self.personality.is_none()
    }
}
