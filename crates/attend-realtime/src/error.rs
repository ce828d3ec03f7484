use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Malformed frame: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Transport is not connected")]
    NotConnected,

    #[error("Transport connection closed")]
    Closed,

    #[error("{transport} transport does not support {operation}")]
    Unsupported {
        transport: &'static str,
        operation: &'static str,
    },

    #[error("Invalid transport configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
