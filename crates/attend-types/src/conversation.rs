use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{lenient_timestamp, Message};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "conversation_id", alias = "conversationId")]
    pub id: String,
    #[serde(
        default,
        alias = "external_user_id",
        alias = "userID",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        default,
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

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: None,
            message_count: 0,
            status: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Conversation together with its full message list (`GET /conversations/{id}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDetails {
    #[serde(flatten)]
    pub conversation: Conversation,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pubsub_layout() {
        let conv: Conversation = serde_json::from_str(
            r#"{"conversation_id":"conv_1","user_id":"user123","status":"active","created_at":"2024-05-01T10:00:00Z","updated_at":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(conv.id, "conv_1");
        assert_eq!(conv.user_id.as_deref(), Some("user123"));
        assert_eq!(conv.message_count, 0);
    }

    #[test]
    fn test_legacy_layout() {
        let details: ConversationDetails = serde_json::from_str(
            r#"{"conversationId":"abc","userID":"u1","message_count":2,"messages":[
                {"id":1,"role":"user","content":"hello"},
                {"id":2,"role":"assistant","content":"hi"}
            ],"created_at":"2024-05-01 10:00:00"}"#,
        )
        .unwrap();
        assert_eq!(details.conversation.id, "abc");
        assert_eq!(details.conversation.message_count, 2);
        assert_eq!(details.messages.len(), 2);
        assert!(details.conversation.created_at.is_some());
    }
}
