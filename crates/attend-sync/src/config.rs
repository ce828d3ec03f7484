use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Which messages from the real-time feed are merged into the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntakePolicy {
    /// Every inbound message; a user echo replaces the matching optimistic entry
    #[default]
    FullEcho,
    /// Only assistant and system messages; the user's own messages come from sends
    AssistantOnly,
}

/// What happens to an optimistic entry once the backend accepted it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// Keep the entry, adopting the persisted id when the receipt carries one
    #[default]
    KeepOptimistic,
    /// Drop the entry and rely on the feed's echo
    AwaitEcho,
}

/// Channel outgoing messages are dispatched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SendRoute {
    #[default]
    Rest,
    /// Frame over the live real-time connection
    Transport,
}

const DEFAULT_PER_PAGE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub intake: IntakePolicy,
    #[serde(default)]
    pub reconcile: ReconcilePolicy,
    #[serde(default)]
    pub route: SendRoute,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            intake: IntakePolicy::default(),
            reconcile: ReconcilePolicy::default(),
            route: SendRoute::default(),
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intake(mut self, intake: IntakePolicy) -> Self {
        self.intake = intake;
        self
    }

    pub fn reconcile(mut self, reconcile: ReconcilePolicy) -> Self {
        self.reconcile = reconcile;
        self
    }

    pub fn route(mut self, route: SendRoute) -> Self {
        self.route = route;
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.per_page == 0 {
            return Err(SyncError::InvalidConfig("per_page must be at least 1".to_string()));
        }
        // Without user echoes an awaited entry would never come back
        if self.reconcile == ReconcilePolicy::AwaitEcho && self.intake == IntakePolicy::AssistantOnly {
            return Err(SyncError::InvalidConfig(
                "await_echo reconciliation requires full_echo intake".to_string(),
            ));
        }
        Ok(())
    }
}
