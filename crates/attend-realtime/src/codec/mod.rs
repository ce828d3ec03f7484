// Wire protocols spoken over the WebSocket connection. The driver owns the
// socket; a codec only turns text frames into events and back.

mod pusher;
mod socket;

pub use pusher::PusherCodec;
pub use socket::SocketCodec;

use attend_types::{Role, TransportEvent};

use crate::error::Result;

/// What a decoded frame means to the connection driver
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// The remote end finished its handshake
    Ready { connection_id: Option<String> },
    /// The remote end named an already open connection; nothing to replay
    Identified { connection_id: String },
    /// Forward to the consumer
    Event(TransportEvent),
    /// Protocol-level reply the driver writes back unchanged (e.g. pong)
    Reply(String),
    Ignored,
}

/// Frames a consumer may push over the connection
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    Chat {
        conversation_id: String,
        content: String,
        role: Role,
    },
}

impl OutboundFrame {
    pub fn chat(conversation_id: impl Into<String>, content: impl Into<String>, role: Role) -> Self {
        OutboundFrame::Chat {
            conversation_id: conversation_id.into(),
            content: content.into(),
            role,
        }
    }
}

/// Strategy for one wire protocol
pub trait FrameCodec: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Whether the connection is usable as soon as the WebSocket opens, or
    /// only after the remote end sends a [`Inbound::Ready`] frame
    fn ready_on_open(&self) -> bool {
        true
    }

    /// Whether [`FrameCodec::encode`] can carry chat messages at all
    fn can_send(&self) -> bool {
        true
    }

    fn decode(&self, text: &str) -> Result<Vec<Inbound>>;

    /// Frame that starts delivery for a conversation, if the protocol has one
    fn subscribe(&self, conversation_id: &str) -> Result<Option<String>>;

    fn unsubscribe(&self, conversation_id: &str) -> Result<Option<String>>;

    fn encode(&self, frame: &OutboundFrame) -> Result<String>;
}
