// Endpoints backing the pub/sub chat: the backend persists messages sent here
// and broadcasts them on the conversation's channel.

use async_trait::async_trait;
use attend_types::{decode_tolerant, Conversation, ConversationDetails, MessagePage, Paginated, Role, SendReceipt};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::client::AttendClient;
use crate::error::{ClientError, Result};
use crate::traits::ChatApi;
use crate::vendors::ensure_accepted;

#[derive(Serialize)]
struct CreateConversationBody<'a> {
    conversation_id: String,
    user_id: &'a str,
}

#[derive(Serialize)]
struct SendBody<'a> {
    conversation_id: &'a str,
    content: &'a str,
    role: Role,
}

#[derive(Serialize)]
struct PageQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    page: u32,
    per_page: u32,
}

#[derive(Serialize)]
struct TypingBody<'a> {
    conversation_id: &'a str,
    user_id: &'a str,
    is_typing: bool,
}

pub struct ChatEndpoints<'a> {
    client: &'a AttendClient,
}

impl<'a> ChatEndpoints<'a> {
    pub(crate) fn new(client: &'a AttendClient) -> Self {
        Self { client }
    }

    /// `POST /chat/conversations`; without an explicit id one is derived from the clock
    pub async fn create_conversation(&self, conversation_id: Option<&str>, user_id: &str) -> Result<Conversation> {
        let body = CreateConversationBody {
            conversation_id: conversation_id
                .map(str::to_string)
                .unwrap_or_else(|| format!("conv_{}", chrono::Utc::now().timestamp_millis())),
            user_id,
        };
        tracing::info!(conversation_id = %body.conversation_id, user_id = %user_id, "Creating conversation");
        self.client.send(Method::POST, "chat/conversations", Some(&body)).await
    }

    pub async fn list_conversations(&self, user_id: &str, page: u32, per_page: u32) -> Result<Paginated<Conversation>> {
        let query = PageQuery {
            user_id: Some(user_id),
            page,
            per_page,
        };
        let value = self.client.get_value("chat/conversations", Some(&query)).await?;
        let inner: Value = decode_tolerant(value)?;
        Ok(Paginated::from_value(inner)?)
    }

    pub async fn conversation_details(&self, conversation_id: &str) -> Result<ConversationDetails> {
        self.client
            .get(&format!("chat/conversations/{}", conversation_id), None::<&()>)
            .await
    }

    /// `POST /chat/send`
    pub async fn send(&self, conversation_id: &str, content: &str, role: Role) -> Result<SendReceipt> {
        let body = SendBody {
            conversation_id,
            content,
            role,
        };
        let receipt: SendReceipt = self.client.send(Method::POST, "chat/send", Some(&body)).await?;
        if !receipt.success {
            return Err(ClientError::Rejected {
                message: "message was not accepted".to_string(),
                errors: Default::default(),
            });
        }
        Ok(receipt)
    }

    /// Page of history, newest first
    pub async fn messages(&self, conversation_id: &str, page: u32, per_page: u32) -> Result<MessagePage> {
        let query = PageQuery {
            user_id: None,
            page,
            per_page,
        };
        let mut page: MessagePage = self
            .client
            .get(&format!("chat/conversations/{}/messages", conversation_id), Some(&query))
            .await?;
        for message in page.messages.iter_mut().filter(|m| m.conversation_id.is_empty()) {
            message.conversation_id = conversation_id.to_string();
        }
        Ok(page)
    }

    /// `POST /chat/typing`. Part of the backend surface; sessions never call it.
    pub async fn typing(&self, conversation_id: &str, user_id: &str, is_typing: bool) -> Result<()> {
        let body = TypingBody {
            conversation_id,
            user_id,
            is_typing,
        };
        let value = self.client.send_value(Method::POST, "chat/typing", Some(&body)).await?;
        ensure_accepted(value)
    }
}

#[async_trait]
impl ChatApi for AttendClient {
    async fn fetch_messages(&self, conversation_id: &str, page: u32, per_page: u32) -> Result<MessagePage> {
        self.chat().messages(conversation_id, page, per_page).await
    }

    async fn send_message(&self, conversation_id: &str, content: &str, role: Role) -> Result<SendReceipt> {
        self.chat().send(conversation_id, content, role).await
    }
}
