use serde::{Deserialize, Serialize};
use std::fmt;

use crate::message::Message;

/// Lifecycle of a real-time connection as seen by a chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        };
        f.write_str(label)
    }
}

/// Peer typing toggle (`user.typing` on the pub/sub channel)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingEvent {
    pub user_id: String,
    pub is_typing: bool,
}

/// Everything a real-time transport reports to its consumer.
///
/// Both transports reduce their wire protocol to these signals, so the
/// session logic never sees a transport-specific frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportEvent {
    /// Connection lifecycle change
    Connection {
        state: ConnectionState,
        #[serde(skip_serializing_if = "Option::is_none")]
        connection_id: Option<String>,
    },

    /// A chat message delivered by the feed
    Message { message: Message },

    /// A peer started or stopped typing
    Typing(TypingEvent),

    /// Error reported by the remote end; the connection itself stays up
    RemoteError { message: String },
}

impl TransportEvent {
    pub fn connection(state: ConnectionState) -> Self {
        TransportEvent::Connection {
            state,
            connection_id: None,
        }
    }
}
