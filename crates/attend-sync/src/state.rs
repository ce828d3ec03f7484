// Session state and the reducer that evolves it. Everything here is pure; the
// async session feeds events in and publishes the result.

use attend_types::{ConnectionState, Message, MessageId, Pagination, Role, TypingEvent};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

use crate::config::{IntakePolicy, ReconcilePolicy};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Session switched to a conversation; everything visible is cleared
    Bound {
        conversation_id: String,
        user_id: String,
    },
    Unbound,
    /// A page of history as returned by the backend (newest first)
    HistoryLoaded {
        page: u32,
        messages: Vec<Message>,
        pagination: Pagination,
    },
    OptimisticInserted(Message),
    /// Dispatch failed; the entry is rolled back
    OptimisticFailed { id: MessageId },
    /// Dispatch succeeded
    OptimisticSettled {
        id: MessageId,
        persisted: Option<Message>,
        reply: Option<Message>,
    },
    /// Message delivered by the real-time feed
    Incoming(Message),
    Typing(TypingEvent),
    ConnectionChanged(ConnectionState),
    RemoteError(String),
    LoadingChanged(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
    /// Oldest first, unique by id
    pub messages: Vec<Message>,
    pub connection: ConnectionState,
    /// Peers currently typing; never contains `user_id`
    pub typing: BTreeSet<String>,
    pub loading: bool,
    pub last_error: Option<String>,
    /// Metadata of the oldest history page loaded so far
    pub pagination: Option<Pagination>,
    /// Optimistic sends still awaiting their dispatch result
    pending: HashSet<MessageId>,
    /// Local ids of our own sends still shown under their temporary id;
    /// the feed's echo may replace them
    unconfirmed: HashSet<MessageId>,
    intake: IntakePolicy,
    reconcile: ReconcilePolicy,
}

/// Read-only view published to observers after every transition
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub conversation_id: Option<String>,
    pub messages: Vec<Message>,
    pub connection: ConnectionState,
    pub typing_users: Vec<String>,
    pub loading: bool,
    pub last_error: Option<String>,
    pub pagination: Option<Pagination>,
    /// Ids of visible messages whose send has not completed yet
    pub pending: Vec<MessageId>,
}

impl SessionSnapshot {
    pub fn is_pending(&self, id: &MessageId) -> bool {
        self.pending.contains(id)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(IntakePolicy::default(), ReconcilePolicy::default())
    }
}

impl SessionState {
    pub fn new(intake: IntakePolicy, reconcile: ReconcilePolicy) -> Self {
        Self {
            conversation_id: None,
            user_id: None,
            messages: Vec::new(),
            connection: ConnectionState::Disconnected,
            typing: BTreeSet::new(),
            loading: false,
            last_error: None,
            pagination: None,
            pending: HashSet::new(),
            unconfirmed: HashSet::new(),
            intake,
            reconcile,
        }
    }

    pub fn intake(&self) -> IntakePolicy {
        self.intake
    }

    pub fn reconcile(&self) -> ReconcilePolicy {
        self.reconcile
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.iter().any(|m| &m.id == id)
    }

    /// Whether `id` is an optimistic send that has not settled or failed
    pub fn is_pending(&self, id: &MessageId) -> bool {
        self.pending.contains(id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            conversation_id: self.conversation_id.clone(),
            messages: self.messages.clone(),
            connection: self.connection,
            typing_users: self.typing.iter().cloned().collect(),
            loading: self.loading,
            last_error: self.last_error.clone(),
            pagination: self.pagination,
            pending: self
                .messages
                .iter()
                .filter(|m| self.pending.contains(&m.id))
                .map(|m| m.id.clone())
                .collect(),
        }
    }

    /// In-place form of [`apply_event`]
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Bound {
                conversation_id,
                user_id,
            } => {
                self.clear();
                self.conversation_id = Some(conversation_id);
                self.user_id = Some(user_id);
            }
            SessionEvent::Unbound => {
                self.clear();
                self.connection = ConnectionState::Disconnected;
            }
            SessionEvent::HistoryLoaded {
                page,
                messages,
                pagination,
            } => self.merge_history(page, messages, pagination),
            SessionEvent::OptimisticInserted(message) => {
                if !self.contains(&message.id) {
                    self.pending.insert(message.id.clone());
                    self.unconfirmed.insert(message.id.clone());
                    self.messages.push(message);
                }
            }
            SessionEvent::OptimisticFailed { id } => {
                self.pending.remove(&id);
                self.unconfirmed.remove(&id);
                self.messages.retain(|m| m.id != id);
            }
            SessionEvent::OptimisticSettled { id, persisted, reply } => {
                self.pending.remove(&id);
                self.settle(id, persisted);
                if let Some(reply) = reply {
                    self.merge_incoming(reply);
                }
            }
            SessionEvent::Incoming(message) => self.merge_incoming(message),
            SessionEvent::Typing(TypingEvent { user_id, is_typing }) => {
                if self.user_id.as_deref() == Some(user_id.as_str()) {
                    return;
                }
                if is_typing {
                    self.typing.insert(user_id);
                } else {
                    self.typing.remove(&user_id);
                }
            }
            SessionEvent::ConnectionChanged(connection) => {
                if connection.is_connected() {
                    self.last_error = None;
                }
                self.connection = connection;
            }
            SessionEvent::RemoteError(message) => self.last_error = Some(message),
            SessionEvent::LoadingChanged(loading) => self.loading = loading,
        }
    }

    fn clear(&mut self) {
        self.conversation_id = None;
        self.user_id = None;
        self.messages.clear();
        self.typing.clear();
        self.loading = false;
        self.last_error = None;
        self.pagination = None;
        self.pending.clear();
        self.unconfirmed.clear();
    }

    fn merge_history(&mut self, page: u32, newest_first: Vec<Message>, pagination: Pagination) {
        let bound = self.conversation_id.clone().unwrap_or_default();
        let mut seen = HashSet::new();
        let mut history: Vec<Message> = newest_first
            .into_iter()
            .rev()
            .filter(|m| seen.insert(m.id.clone()))
            .map(|mut m| {
                if m.conversation_id.is_empty() {
                    m.conversation_id = bound.clone();
                }
                m
            })
            .collect();

        if page <= 1 {
            // The page is authoritative. Only in-flight sends and feed messages
            // newer than the page survive; settled local entries and id-less
            // history rows are superseded by it.
            let newest = history.iter().filter_map(|m| m.id.as_server()).max();
            let pending = &self.pending;
            let survivors: Vec<Message> = self
                .messages
                .drain(..)
                .filter(|m| !seen.contains(&m.id))
                .filter(|m| match (m.id.as_server(), newest) {
                    (None, _) => pending.contains(&m.id),
                    (Some(_), None) => true,
                    (Some(id), Some(newest)) => id > newest,
                })
                .collect();
            self.unconfirmed.retain(|id| pending.contains(id));
            history.extend(survivors);
            self.messages = history;
            self.pagination = Some(pagination);
        } else {
            history.retain(|m| !self.contains(&m.id));
            history.append(&mut self.messages);
            self.messages = history;
            self.pagination = Some(pagination);
        }
    }

    fn settle(&mut self, id: MessageId, persisted: Option<Message>) {
        let Some(index) = self.messages.iter().position(|m| m.id == id) else {
            // Already replaced by the feed's echo
            self.unconfirmed.remove(&id);
            return;
        };

        match self.reconcile {
            ReconcilePolicy::AwaitEcho => {
                self.unconfirmed.remove(&id);
                self.messages.remove(index);
            }
            ReconcilePolicy::KeepOptimistic => {
                // Without a persisted copy the entry waits for the echo or a reload
                let Some(mut persisted) = persisted else {
                    return;
                };
                self.unconfirmed.remove(&id);
                if self.contains(&persisted.id) {
                    self.messages.remove(index);
                    return;
                }
                if persisted.conversation_id.is_empty() {
                    persisted.conversation_id = self.messages[index].conversation_id.clone();
                }
                self.messages[index] = persisted;
            }
        }
    }

    fn merge_incoming(&mut self, mut message: Message) {
        let Some(bound) = self.conversation_id.as_deref() else {
            return;
        };
        if message.conversation_id.is_empty() {
            message.conversation_id = bound.to_string();
        } else if message.conversation_id != bound {
            tracing::debug!(
                conversation_id = %message.conversation_id,
                bound = %bound,
                "Dropping message for another conversation"
            );
            return;
        }

        if self.intake == IntakePolicy::AssistantOnly && message.role == Role::User {
            return;
        }
        if self.contains(&message.id) {
            return;
        }

        if self.intake == IntakePolicy::FullEcho && !message.id.is_local() {
            let echo_of = self
                .messages
                .iter()
                .position(|m| self.unconfirmed.contains(&m.id) && m.role == message.role && m.content == message.content);
            if let Some(index) = echo_of {
                self.unconfirmed.remove(&self.messages[index].id);
                self.messages[index] = message;
                return;
            }
        }

        self.messages.push(message);
    }
}

/// Pure transition function of the session state machine
pub fn apply_event(mut state: SessionState, event: SessionEvent) -> SessionState {
    state.apply(event);
    state
}
