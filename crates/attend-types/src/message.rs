use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::pagination::Pagination;

/// Identifier of a chat message.
///
/// Persisted messages carry the numeric id assigned by the backend. Messages
/// synthesised on the client (optimistic sends, replies that arrive without an
/// id) carry a `local-` prefixed string that never reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Server(i64),
    Local(String),
}

impl MessageId {
    /// Fresh client-side identifier
    pub fn local() -> Self {
        MessageId::Local(format!("local-{}", uuid::Uuid::new_v4()))
    }

    pub fn is_local(&self) -> bool {
        matches!(self, MessageId::Local(_))
    }

    pub fn as_server(&self) -> Option<i64> {
        match self {
            MessageId::Server(id) => Some(*id),
            MessageId::Local(_) => None,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Server(id) => write!(f, "{}", id),
            MessageId::Local(id) => f.write_str(id),
        }
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        MessageId::Server(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Roles produced by the assistant side of the conversation
    pub fn is_assistant_side(&self) -> bool {
        matches!(self, Role::Assistant | Role::System)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "MessageId::local")]
    pub id: MessageId,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "conversationId")]
    pub conversation_id: String,
    #[serde(
        default,
        alias = "timestamp",
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(
        id: impl Into<MessageId>,
        role: Role,
        content: impl Into<String>,
        conversation_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            conversation_id: conversation_id.into(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Client-side message shown before the backend has acknowledged it
    pub fn optimistic(conversation_id: impl Into<String>, content: impl Into<String>, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: MessageId::local(),
            role,
            content: content.into(),
            conversation_id: conversation_id.into(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn is_optimistic(&self) -> bool {
        self.id.is_local()
    }
}

/// One page of conversation history as returned by the backend (newest first)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePage {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Result of `POST /chat/send`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendReceipt {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(rename = "userMessage", alias = "user_message", default)]
    pub user_message: Option<Message>,
    /// Only present when the sent message had the `user` role
    #[serde(rename = "aiMessage", alias = "ai_message", default)]
    pub ai_message: Option<Message>,
}

fn default_true() -> bool {
    true
}

/// Accepts RFC 3339 timestamps as well as the `YYYY-MM-DD HH:MM:SS` form some
/// backend endpoints still emit. Anything unparseable becomes `None`.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| parse_timestamp(&value)))
}

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
