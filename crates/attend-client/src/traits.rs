use async_trait::async_trait;
use attend_types::{MessagePage, Role, SendReceipt};

use crate::error::Result;

/// Chat operations a conversation session needs from the backend.
///
/// Implemented by [`crate::AttendClient`] for the pub/sub-backed endpoints and
/// by [`crate::LegacyChatApi`] for the older conversation endpoints. Session
/// tests provide their own implementations.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Fetch one page of history, newest message first
    async fn fetch_messages(&self, conversation_id: &str, page: u32, per_page: u32) -> Result<MessagePage>;

    /// Persist a message; the receipt may carry a generated assistant reply
    async fn send_message(&self, conversation_id: &str, content: &str, role: Role) -> Result<SendReceipt>;
}
