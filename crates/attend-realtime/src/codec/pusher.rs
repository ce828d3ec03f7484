use attend_types::{Message, TransportEvent, TypingEvent};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{FrameCodec, Inbound, OutboundFrame};
use crate::error::{Result, TransportError};

const EVENT_MESSAGE_SENT: &str = "message.sent";
const EVENT_USER_TYPING: &str = "user.typing";

/// Pusher protocol 7 frame. `data` is usually a JSON document encoded as a
/// string, but some servers send the object inline.
#[derive(Debug, Deserialize, Serialize)]
struct PusherFrame {
    event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
    #[serde(default)]
    data: Value,
}

impl PusherFrame {
    fn payload(&self) -> Result<Value> {
        match &self.data {
            Value::String(raw) if raw.trim_start().starts_with(['{', '[']) => Ok(serde_json::from_str(raw)?),
            other => Ok(other.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConnectionEstablished {
    socket_id: String,
}

#[derive(Debug, Deserialize)]
struct PusherErrorData {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessagePayload {
    Wrapped { message: Message },
    Bare(Message),
}

#[derive(Debug, Deserialize)]
struct TypingPayload {
    user_id: Value,
    #[serde(default)]
    is_typing: bool,
}

/// Pusher Channels client protocol, one channel per conversation
/// (`conversation.{id}`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PusherCodec;

impl PusherCodec {
    pub fn channel_name(conversation_id: &str) -> String {
        format!("conversation.{}", conversation_id)
    }

    fn control(event: &str, channel: &str) -> Result<String> {
        Ok(serde_json::to_string(&json!({
            "event": event,
            "data": { "channel": channel },
        }))?)
    }

    fn channel_event(event: &str, payload: Value) -> Result<Inbound> {
        // Laravel broadcasts may prefix custom event names with a dot
        match event.trim_start_matches('.') {
            EVENT_MESSAGE_SENT => {
                let message = match serde_json::from_value::<MessagePayload>(payload)? {
                    MessagePayload::Wrapped { message } | MessagePayload::Bare(message) => message,
                };
                Ok(Inbound::Event(TransportEvent::Message { message }))
            }
            EVENT_USER_TYPING => {
                let typing: TypingPayload = serde_json::from_value(payload)?;
                let user_id = match typing.user_id {
                    Value::String(id) => id,
                    other => other.to_string(),
                };
                Ok(Inbound::Event(TransportEvent::Typing(TypingEvent {
                    user_id,
                    is_typing: typing.is_typing,
                })))
            }
            other => {
                tracing::debug!(event = %other, "Ignoring unhandled channel event");
                Ok(Inbound::Ignored)
            }
        }
    }
}

impl FrameCodec for PusherCodec {
    fn name(&self) -> &'static str {
        "pusher"
    }

    fn ready_on_open(&self) -> bool {
        false
    }

    fn can_send(&self) -> bool {
        false
    }

    fn decode(&self, text: &str) -> Result<Vec<Inbound>> {
        let frame: PusherFrame = serde_json::from_str(text)?;
        let inbound = match frame.event.as_str() {
            "pusher:connection_established" => {
                let established: ConnectionEstablished = serde_json::from_value(frame.payload()?)?;
                Inbound::Ready {
                    connection_id: Some(established.socket_id),
                }
            }
            "pusher:error" => {
                let error: PusherErrorData = serde_json::from_value(frame.payload()?).unwrap_or(PusherErrorData {
                    message: None,
                    code: None,
                });
                let message = match (error.message, error.code) {
                    (Some(message), Some(code)) => format!("{} (code {})", message, code),
                    (Some(message), None) => message,
                    (None, Some(code)) => format!("pusher error code {}", code),
                    (None, None) => "pusher error".to_string(),
                };
                Inbound::Event(TransportEvent::RemoteError { message })
            }
            "pusher:ping" => Inbound::Reply(serde_json::to_string(&json!({
                "event": "pusher:pong",
                "data": {},
            }))?),
            "pusher:pong" => Inbound::Ignored,
            event if event.starts_with("pusher_internal:") => {
                tracing::debug!(event = %event, channel = ?frame.channel, "Pusher internal event");
                Inbound::Ignored
            }
            event => Self::channel_event(event, frame.payload()?)?,
        };
        Ok(vec![inbound])
    }

    fn subscribe(&self, conversation_id: &str) -> Result<Option<String>> {
        Self::control("pusher:subscribe", &Self::channel_name(conversation_id)).map(Some)
    }

    fn unsubscribe(&self, conversation_id: &str) -> Result<Option<String>> {
        Self::control("pusher:unsubscribe", &Self::channel_name(conversation_id)).map(Some)
    }

    /// Client events need a private channel; messages go through the REST API
    fn encode(&self, _frame: &OutboundFrame) -> Result<String> {
        Err(TransportError::Unsupported {
            transport: "pusher",
            operation: "chat frames",
        })
    }
}
