//! Conversation session sync.
//!
//! A [`ChatSession`] keeps one conversation's message list consistent while
//! history pages, optimistic sends and real-time deliveries race each other.
//! The transitions themselves live in [`state::apply_event`], a pure function
//! that can be exercised without any network.

pub mod builder;
pub mod config;
pub mod error;
pub mod session;
pub mod state;

pub use builder::ChatSessionBuilder;
pub use config::{IntakePolicy, ReconcilePolicy, SendRoute, SessionConfig};
pub use error::{DispatchError, Result, SyncError};
pub use session::ChatSession;
pub use state::{apply_event, SessionEvent, SessionSnapshot, SessionState};
