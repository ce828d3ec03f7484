use attend_client::ClientError;
use attend_realtime::TransportError;
use thiserror::Error;

/// Why a dispatched message did not reach the backend
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to load history: {0}")]
    Fetch(#[source] ClientError),

    /// Carries the text that was not sent so the caller can restore its input
    #[error("Failed to send message: {source}")]
    Send {
        content: String,
        source: DispatchError,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Unsent text of a failed send
    pub fn unsent_content(&self) -> Option<&str> {
        match self {
            SyncError::Send { content, .. } => Some(content),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
