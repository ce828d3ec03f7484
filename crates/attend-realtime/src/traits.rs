use async_trait::async_trait;
use attend_types::{ConnectionState, TransportEvent};
use tokio::sync::mpsc;

use crate::codec::OutboundFrame;
use crate::error::Result;

/// Real-time channel a chat session rides on.
///
/// `connect` starts the connection in the background and hands back the only
/// receiver of its events. Subscriptions are remembered and replayed after
/// every reconnect, so callers subscribe once per conversation.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self) -> Result<mpsc::Receiver<TransportEvent>>;

    async fn subscribe(&self, conversation_id: &str) -> Result<()>;

    async fn unsubscribe(&self, conversation_id: &str) -> Result<()>;

    /// Push a frame over the live connection
    async fn send(&self, frame: OutboundFrame) -> Result<()>;

    /// False for receive-only transports, whose `send` always fails
    fn supports_send(&self) -> bool {
        true
    }

    /// Stop the connection and its reconnect loop
    async fn disconnect(&self) -> Result<()>;

    fn state(&self) -> ConnectionState;

    fn name(&self) -> &'static str;
}
