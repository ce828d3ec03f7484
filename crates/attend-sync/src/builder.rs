use attend_client::ChatApi;
use attend_realtime::Transport;
use std::sync::Arc;

use crate::config::{IntakePolicy, ReconcilePolicy, SendRoute, SessionConfig};
use crate::error::{Result, SyncError};
use crate::session::ChatSession;

pub struct ChatSessionBuilder {
    api: Option<Arc<dyn ChatApi>>,
    transport: Option<Arc<dyn Transport>>,
    config: SessionConfig,
}

impl ChatSessionBuilder {
    pub fn new() -> Self {
        Self {
            api: None,
            transport: None,
            config: SessionConfig::default(),
        }
    }

    pub fn api(mut self, api: Arc<dyn ChatApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn intake(mut self, intake: IntakePolicy) -> Self {
        self.config.intake = intake;
        self
    }

    pub fn reconcile(mut self, reconcile: ReconcilePolicy) -> Self {
        self.config.reconcile = reconcile;
        self
    }

    pub fn route(mut self, route: SendRoute) -> Self {
        self.config.route = route;
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.config.per_page = per_page;
        self
    }

    pub fn build(self) -> Result<ChatSession> {
        let api = self
            .api
            .ok_or_else(|| SyncError::InvalidConfig("chat api is required".to_string()))?;
        let transport = self
            .transport
            .ok_or_else(|| SyncError::InvalidConfig("transport is required".to_string()))?;
        ChatSession::new(api, transport, self.config)
    }
}

impl Default for ChatSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
