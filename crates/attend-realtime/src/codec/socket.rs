use attend_types::{Message, MessageId, Role, TransportEvent};
use serde::{Deserialize, Serialize};

use super::{FrameCodec, Inbound, OutboundFrame};
use crate::error::Result;

/// Frames received from the raw chat socket
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ServerFrame {
    #[serde(rename = "connection")]
    Connection {
        #[serde(default, rename = "connectionId")]
        connection_id: Option<String>,
    },
    #[serde(rename = "conversationSet")]
    ConversationSet {
        #[serde(default, rename = "conversationId")]
        conversation_id: Option<String>,
    },
    #[serde(rename = "chatResponse")]
    ChatResponse {
        #[serde(default = "default_true")]
        success: bool,
        #[serde(default)]
        response: String,
        #[serde(default, rename = "conversationId")]
        conversation_id: String,
        #[serde(default, rename = "messageId")]
        message_id: Option<i64>,
        #[serde(default)]
        error: Option<String>,
    },
    #[serde(rename = "message")]
    Message { message: Message },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: String,
    },
    #[serde(other)]
    Unknown,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ClientFrame<'a> {
    #[serde(rename = "setConversation")]
    SetConversation {
        #[serde(rename = "conversationId")]
        conversation_id: &'a str,
    },
    #[serde(rename = "chat")]
    Chat {
        #[serde(rename = "conversationId")]
        conversation_id: &'a str,
        content: &'a str,
        role: Role,
    },
}

/// JSON envelopes of the standalone chat socket server.
///
/// The server answers a `chat` frame with a `chatResponse` carrying only the
/// assistant's text; it becomes an assistant [`Message`] with a client-side id
/// unless the server also reports the persisted id.
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketCodec;

impl FrameCodec for SocketCodec {
    fn name(&self) -> &'static str {
        "socket"
    }

    fn decode(&self, text: &str) -> Result<Vec<Inbound>> {
        let frame: ServerFrame = serde_json::from_str(text)?;
        let inbound = match frame {
            ServerFrame::Connection { connection_id } => match connection_id {
                Some(connection_id) => Inbound::Identified { connection_id },
                None => Inbound::Ignored,
            },
            ServerFrame::ConversationSet { conversation_id } => {
                tracing::debug!(conversation_id = ?conversation_id, "Socket conversation set");
                Inbound::Ignored
            }
            ServerFrame::ChatResponse {
                success: true,
                response,
                conversation_id,
                message_id,
                ..
            } => {
                let id = message_id.map(MessageId::Server).unwrap_or_else(MessageId::local);
                let message = Message::new(id, Role::Assistant, response, conversation_id)
                    .with_created_at(chrono::Utc::now());
                Inbound::Event(TransportEvent::Message { message })
            }
            ServerFrame::ChatResponse { error, .. } => Inbound::Event(TransportEvent::RemoteError {
                message: error.unwrap_or_else(|| "chat request failed".to_string()),
            }),
            ServerFrame::Message { message } => Inbound::Event(TransportEvent::Message { message }),
            ServerFrame::Error { message } => Inbound::Event(TransportEvent::RemoteError { message }),
            ServerFrame::Unknown => {
                tracing::debug!(frame = %text, "Ignoring unknown socket frame");
                Inbound::Ignored
            }
        };
        Ok(vec![inbound])
    }

    fn subscribe(&self, conversation_id: &str) -> Result<Option<String>> {
        let frame = ClientFrame::SetConversation { conversation_id };
        Ok(Some(serde_json::to_string(&frame)?))
    }

    /// The socket has no way to leave a conversation; the next
    /// `setConversation` replaces it.
    fn unsubscribe(&self, _conversation_id: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn encode(&self, frame: &OutboundFrame) -> Result<String> {
        match frame {
            OutboundFrame::Chat {
                conversation_id,
                content,
                role,
            } => Ok(serde_json::to_string(&ClientFrame::Chat {
                conversation_id,
                content,
                role: *role,
            })?),
        }
    }
}
