pub mod codec;
pub mod config;
pub mod error;
pub mod traits;
pub mod transport;

mod driver;

pub use codec::{FrameCodec, Inbound, OutboundFrame, PusherCodec, SocketCodec};
pub use config::{Backoff, PusherConfig, ReconnectPolicy, SocketConfig};
pub use error::{Result, TransportError};
pub use traits::Transport;
pub use transport::{PusherTransport, SocketTransport, WsTransport};
