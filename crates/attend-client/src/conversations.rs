// Older conversation endpoints, used by the raw-socket chat

use async_trait::async_trait;
use attend_types::{
    decode_tolerant, Conversation, ConversationDetails, Message, MessageId, MessagePage, Pagination, Role,
    SendReceipt, Vendor,
};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::AttendClient;
use crate::error::Result;
use crate::traits::ChatApi;

/// Reply of `POST /conversations/{id}/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyChatReply {
    pub response: String,
    #[serde(default, alias = "conversationId")]
    pub conversation_id: String,
    #[serde(default)]
    pub message_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBrief {
    pub event_type: String,
    #[serde(default)]
    pub guest_count: u32,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub budget_range: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct EventBriefEnvelope {
    event_brief: EventBrief,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorRecommendations {
    pub recommendations: String,
    #[serde(default)]
    pub available_vendors: Vec<Vendor>,
}

#[derive(Serialize)]
struct ListQuery<'a> {
    page: u32,
    per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

pub struct ConversationEndpoints<'a> {
    client: &'a AttendClient,
}

impl<'a> ConversationEndpoints<'a> {
    pub(crate) fn new(client: &'a AttendClient) -> Self {
        Self { client }
    }

    /// `POST /conversations`
    pub async fn create(&self, user_id: Option<&str>, metadata: Option<Value>) -> Result<Conversation> {
        let now = chrono::Utc::now();
        let body = json!({
            "user_id": user_id
                .map(str::to_string)
                .unwrap_or_else(|| format!("user_{}", now.timestamp_millis())),
            "metadata": metadata.unwrap_or_else(|| json!({
                "source": "attend_cli",
                "timestamp": now.to_rfc3339(),
            })),
        });
        self.client.send(Method::POST, "conversations", Some(&body)).await
    }

    /// `GET /conversations`; the list may come bare, under `conversations`, or in an envelope
    pub async fn list(&self, page: u32, per_page: u32, user_id: Option<&str>) -> Result<Vec<Conversation>> {
        let query = ListQuery { page, per_page, user_id };
        let value = self.client.get_value("conversations", Some(&query)).await?;
        let mut inner: Value = decode_tolerant(value)?;
        if let Some(list) = inner.get_mut("conversations") {
            return Ok(serde_json::from_value(list.take())?);
        }
        Ok(serde_json::from_value(inner)?)
    }

    /// Conversation with every message, oldest first
    pub async fn get(&self, conversation_id: &str) -> Result<ConversationDetails> {
        self.client
            .get(&format!("conversations/{}", conversation_id), None::<&()>)
            .await
    }

    pub async fn send_message(&self, conversation_id: &str, message: &str) -> Result<LegacyChatReply> {
        self.client
            .send(
                Method::POST,
                &format!("conversations/{}/chat", conversation_id),
                Some(&json!({ "message": message })),
            )
            .await
    }

    pub async fn event_brief(&self, conversation_id: &str) -> Result<EventBrief> {
        let wrapped: EventBriefEnvelope = self
            .client
            .send(
                Method::POST,
                &format!("conversations/{}/event-brief", conversation_id),
                None::<&()>,
            )
            .await?;
        Ok(wrapped.event_brief)
    }

    pub async fn vendor_recommendations(
        &self,
        conversation_id: &str,
        category: Option<&str>,
        location: Option<&str>,
    ) -> Result<VendorRecommendations> {
        let mut body = serde_json::Map::new();
        if let Some(category) = category {
            body.insert("category".to_string(), json!(category));
        }
        if let Some(location) = location {
            body.insert("location".to_string(), json!(location));
        }
        self.client
            .send(
                Method::POST,
                &format!("conversations/{}/vendor-recommendations", conversation_id),
                Some(&Value::Object(body)),
            )
            .await
    }
}

/// [`ChatApi`] over the older conversation endpoints.
///
/// The full history comes back in one response, so it is reported as a
/// single page. The chat endpoint only answers with the assistant's text; it
/// is surfaced as an assistant message with a client-side id.
#[derive(Debug, Clone)]
pub struct LegacyChatApi {
    client: AttendClient,
}

impl LegacyChatApi {
    pub fn new(client: AttendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatApi for LegacyChatApi {
    async fn fetch_messages(&self, conversation_id: &str, page: u32, _per_page: u32) -> Result<MessagePage> {
        if page > 1 {
            return Ok(MessagePage {
                messages: Vec::new(),
                pagination: Pagination {
                    current_page: page,
                    ..Pagination::default()
                },
            });
        }

        let details = self.client.conversations().get(conversation_id).await?;
        let total = details.messages.len();
        let messages = details
            .messages
            .into_iter()
            .rev()
            .map(|mut message| {
                if message.conversation_id.is_empty() {
                    message.conversation_id = conversation_id.to_string();
                }
                message
            })
            .collect();

        Ok(MessagePage {
            messages,
            pagination: Pagination::single(total),
        })
    }

    async fn send_message(&self, conversation_id: &str, content: &str, role: Role) -> Result<SendReceipt> {
        if role != Role::User {
            tracing::debug!(role = %role, "Legacy chat endpoint ignores message role");
        }
        let reply = self.client.conversations().send_message(conversation_id, content).await?;
        let ai_message = Message::new(MessageId::local(), Role::Assistant, reply.response, conversation_id)
            .with_created_at(chrono::Utc::now());

        Ok(SendReceipt {
            success: true,
            user_message: None,
            ai_message: Some(ai_message),
        })
    }
}
