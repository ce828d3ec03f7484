pub mod bot_config;
pub mod chat;
pub mod client;
pub mod config;
pub mod conversations;
pub mod error;
pub mod health;
pub mod traits;
pub mod vendors;

pub use client::AttendClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use conversations::{EventBrief, LegacyChatApi, LegacyChatReply, VendorRecommendations};
pub use error::{ClientError, Result};
pub use traits::ChatApi;
