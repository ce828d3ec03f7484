pub mod bot_config;
pub mod conversation;
pub mod envelope;
pub mod events;
pub mod health;
pub mod message;
pub mod pagination;
pub mod vendor;

pub use bot_config::{BotConfig, BotConfigUpdate};
pub use conversation::{Conversation, ConversationDetails};
pub use envelope::{decode_tolerant, ApiEnvelope, EnvelopeError};
pub use events::{ConnectionState, TransportEvent, TypingEvent};
pub use health::HealthStatus;
pub use message::{Message, MessageId, MessagePage, Role, SendReceipt};
pub use pagination::{Paginated, Pagination};
pub use vendor::{
    SortOrder, Vendor, VendorAvailability, VendorCategory, VendorCategoryCount, VendorContact,
    VendorCredentials, VendorDraft, VendorLocation, VendorPackage, VendorPricing, VendorQuery,
    VendorStats,
};
