use attend_client::ChatApi;
use attend_realtime::{OutboundFrame, Transport};
use attend_types::{ConnectionState, Message, MessageId, Pagination, Role, SendReceipt, TransportEvent};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::config::{SendRoute, SessionConfig};
use crate::error::{DispatchError, Result, SyncError};
use crate::state::{SessionEvent, SessionSnapshot, SessionState};

/// State plus the bind generation it belongs to. Work started under an older
/// epoch is discarded when it completes.
struct Inner {
    epoch: u64,
    state: SessionState,
}

struct Shared {
    inner: RwLock<Inner>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl Shared {
    /// Apply `event` unless `epoch` is stale. Returns whether it was applied.
    async fn apply(&self, event: SessionEvent, epoch: u64) -> bool {
        let mut inner = self.inner.write().await;
        if inner.epoch != epoch {
            return false;
        }
        inner.state.apply(event);
        self.snapshots.send_replace(inner.state.snapshot());
        true
    }

    async fn bound(&self) -> Option<(String, u64)> {
        let inner = self.inner.read().await;
        inner.state.conversation_id.clone().map(|id| (id, inner.epoch))
    }
}

/// One user's live view of one conversation.
///
/// History comes from a [`ChatApi`], live updates from a [`Transport`]. The
/// visible list stays ordered oldest first and unique by message id however
/// history pages, sends and feed deliveries interleave.
pub struct ChatSession {
    api: Arc<dyn ChatApi>,
    transport: Arc<dyn Transport>,
    config: SessionConfig,
    shared: Arc<Shared>,
    /// Feed task of the current binding; the lock also serialises binds
    intake: Mutex<Option<JoinHandle<()>>>,
}

impl ChatSession {
    pub fn new(api: Arc<dyn ChatApi>, transport: Arc<dyn Transport>, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        if config.route == SendRoute::Transport && !transport.supports_send() {
            return Err(SyncError::InvalidConfig(format!(
                "the {} transport cannot send, use the rest route",
                transport.name()
            )));
        }

        let state = SessionState::new(config.intake, config.reconcile);
        let (snapshots, _) = watch::channel(state.snapshot());

        Ok(Self {
            api,
            transport,
            config,
            shared: Arc::new(Shared {
                inner: RwLock::new(Inner { epoch: 0, state }),
                snapshots,
            }),
            intake: Mutex::new(None),
        })
    }

    pub fn builder() -> crate::builder::ChatSessionBuilder {
        crate::builder::ChatSessionBuilder::new()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Switch to `conversation_id`, or to no conversation at all with `None`.
    ///
    /// The previous feed is torn down first. Binding the same pair again
    /// while its feed is alive does nothing.
    pub async fn bind(&self, conversation_id: Option<&str>, user_id: &str) -> Result<()> {
        let mut intake = self.intake.lock().await;

        let previous = {
            let inner = self.shared.inner.read().await;
            let same_target = inner.state.conversation_id.as_deref() == conversation_id
                && (conversation_id.is_none() || inner.state.user_id.as_deref() == Some(user_id));
            let feed_alive = intake.as_ref().map_or(false, |task| !task.is_finished());
            if same_target && (conversation_id.is_none() || feed_alive) {
                tracing::debug!(conversation_id = ?conversation_id, "Session already bound");
                return Ok(());
            }
            inner.state.conversation_id.clone()
        };

        if let Some(task) = intake.take() {
            task.abort();
        }
        if let Some(previous) = previous.as_deref() {
            if let Err(e) = self.transport.unsubscribe(previous).await {
                tracing::debug!(conversation_id = %previous, error = %e, "Unsubscribe failed");
            }
            if let Err(e) = self.transport.disconnect().await {
                tracing::warn!(conversation_id = %previous, error = %e, "Disconnect failed");
            }
        }

        let epoch = {
            let mut inner = self.shared.inner.write().await;
            inner.epoch += 1;
            let event = match conversation_id {
                Some(id) => SessionEvent::Bound {
                    conversation_id: id.to_string(),
                    user_id: user_id.to_string(),
                },
                None => SessionEvent::Unbound,
            };
            inner.state.apply(event);
            self.shared.snapshots.send_replace(inner.state.snapshot());
            inner.epoch
        };

        let Some(conversation_id) = conversation_id else {
            tracing::info!("Session unbound");
            return Ok(());
        };

        tracing::info!(
            conversation_id = %conversation_id,
            user_id = %user_id,
            transport = self.transport.name(),
            "Binding session"
        );

        let events = match self.transport.connect().await {
            Ok(events) => events,
            Err(e) => {
                self.shared
                    .apply(SessionEvent::ConnectionChanged(ConnectionState::Error), epoch)
                    .await;
                return Err(SyncError::Transport(e));
            }
        };
        *intake = Some(tokio::spawn(run_intake(Arc::clone(&self.shared), events, epoch)));

        if let Err(e) = self.transport.subscribe(conversation_id).await {
            tracing::warn!(conversation_id = %conversation_id, error = %e, "Subscribe failed");
            self.shared
                .apply(SessionEvent::ConnectionChanged(ConnectionState::Error), epoch)
                .await;
            return Err(SyncError::Transport(e));
        }

        Ok(())
    }

    pub async fn unbind(&self) -> Result<()> {
        self.bind(None, "").await
    }

    /// Load history page `page` (1 = newest). `Ok(None)` when nothing is
    /// bound or the session was rebound while the page was in flight.
    pub async fn load_history(&self, page: u32) -> Result<Option<Pagination>> {
        let Some((conversation_id, epoch)) = self.shared.bound().await else {
            return Ok(None);
        };
        let page = page.max(1);

        self.shared.apply(SessionEvent::LoadingChanged(true), epoch).await;
        let fetched = self
            .api
            .fetch_messages(&conversation_id, page, self.config.per_page)
            .await;
        let fetched = match fetched {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(conversation_id = %conversation_id, page, error = %e, "History fetch failed");
                self.shared.apply(SessionEvent::LoadingChanged(false), epoch).await;
                return Err(SyncError::Fetch(e));
            }
        };

        let pagination = fetched.pagination;
        let count = fetched.messages.len();
        let applied = self
            .shared
            .apply(
                SessionEvent::HistoryLoaded {
                    page,
                    messages: fetched.messages,
                    pagination,
                },
                epoch,
            )
            .await;
        if !applied {
            tracing::debug!(conversation_id = %conversation_id, page, "Discarding stale history page");
            return Ok(None);
        }
        self.shared.apply(SessionEvent::LoadingChanged(false), epoch).await;

        tracing::debug!(conversation_id = %conversation_id, page, count, "History page merged");
        Ok(Some(pagination))
    }

    pub async fn reload(&self) -> Result<Option<Pagination>> {
        self.load_history(1).await
    }

    /// Next older page, if the backend reported one
    pub async fn load_more(&self) -> Result<Option<Pagination>> {
        let next = {
            let inner = self.shared.inner.read().await;
            match inner.state.pagination {
                Some(pagination) => pagination.next_page(),
                None => Some(1),
            }
        };
        match next {
            Some(page) => self.load_history(page).await,
            None => Ok(None),
        }
    }

    /// Send `content` as `role`.
    ///
    /// The message is shown immediately and rolled back if dispatch fails.
    /// Blank content, or no bound conversation, is a no-op returning `Ok(None)`.
    /// Content is dispatched exactly as given; whitespace only matters for
    /// the blank check.
    pub async fn send(&self, content: &str, role: Role) -> Result<Option<Message>> {
        if content.trim().is_empty() {
            return Ok(None);
        }
        let Some((conversation_id, epoch)) = self.shared.bound().await else {
            return Ok(None);
        };

        let optimistic = Message::optimistic(conversation_id.as_str(), content, role);
        let local_id = optimistic.id.clone();
        let inserted = self
            .shared
            .apply(SessionEvent::OptimisticInserted(optimistic.clone()), epoch)
            .await;
        if !inserted {
            return Ok(None);
        }

        match self.dispatch(&conversation_id, content, role).await {
            Ok(receipt) => {
                let shown = receipt.user_message.clone().unwrap_or(optimistic);
                self.shared
                    .apply(
                        SessionEvent::OptimisticSettled {
                            id: local_id,
                            persisted: receipt.user_message,
                            reply: receipt.ai_message,
                        },
                        epoch,
                    )
                    .await;
                Ok(Some(shown))
            }
            Err(source) => {
                tracing::warn!(conversation_id = %conversation_id, error = %source, "Send failed, rolling back");
                self.shared
                    .apply(SessionEvent::OptimisticFailed { id: local_id }, epoch)
                    .await;
                Err(SyncError::Send {
                    content: content.to_string(),
                    source,
                })
            }
        }
    }

    async fn dispatch(&self, conversation_id: &str, text: &str, role: Role) -> std::result::Result<SendReceipt, DispatchError> {
        match self.config.route {
            SendRoute::Rest => Ok(self.api.send_message(conversation_id, text, role).await?),
            SendRoute::Transport => {
                self.transport
                    .send(OutboundFrame::chat(conversation_id, text, role))
                    .await?;
                Ok(SendReceipt {
                    success: true,
                    user_message: None,
                    ai_message: None,
                })
            }
        }
    }

    /// Outbound typing signals are not sent; peers' signals are still shown
    pub fn notify_typing(&self, is_typing: bool) {
        tracing::trace!(is_typing, "Typing notification not forwarded");
    }

    /// Observe every state transition
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.shared.snapshots.borrow().messages.clone()
    }

    pub fn message_ids(&self) -> Vec<MessageId> {
        self.shared.snapshots.borrow().messages.iter().map(|m| m.id.clone()).collect()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.shared.snapshots.borrow().connection
    }

    pub fn typing_users(&self) -> Vec<String> {
        self.shared.snapshots.borrow().typing_users.clone()
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.shared.snapshots.borrow().conversation_id.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.snapshots.borrow().loading
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        if let Ok(mut intake) = self.intake.try_lock() {
            if let Some(task) = intake.take() {
                task.abort();
            }
        }
    }
}

async fn run_intake(shared: Arc<Shared>, mut events: mpsc::Receiver<TransportEvent>, epoch: u64) {
    while let Some(event) = events.recv().await {
        let event = match event {
            TransportEvent::Connection { state, connection_id } => {
                tracing::debug!(state = %state, connection_id = ?connection_id, "Connection state changed");
                SessionEvent::ConnectionChanged(state)
            }
            TransportEvent::Message { message } => SessionEvent::Incoming(message),
            TransportEvent::Typing(typing) => SessionEvent::Typing(typing),
            TransportEvent::RemoteError { message } => {
                tracing::warn!(error = %message, "Remote error");
                SessionEvent::RemoteError(message)
            }
        };
        if !shared.apply(event, epoch).await {
            break;
        }
    }
    tracing::debug!(epoch, "Intake stopped");
}
