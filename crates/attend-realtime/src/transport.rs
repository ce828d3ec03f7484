use async_trait::async_trait;
use attend_types::{ConnectionState, TransportEvent};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::codec::{FrameCodec, OutboundFrame, PusherCodec, SocketCodec};
use crate::config::{PusherConfig, ReconnectPolicy, SocketConfig};
use crate::driver::{Command, ConnectionDriver};
use crate::error::{Result, TransportError};
use crate::traits::Transport;

const EVENT_BUFFER: usize = 256;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

struct ConnectionHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

/// WebSocket transport speaking the protocol of codec `C`
pub struct WsTransport<C: FrameCodec> {
    url: String,
    codec: Arc<C>,
    policy: ReconnectPolicy,
    handle: Mutex<Option<ConnectionHandle>>,
}

/// Raw JSON socket (`setConversation` / `chat` frames)
pub type SocketTransport = WsTransport<SocketCodec>;

/// Pusher Channels subscription to `conversation.{id}`
pub type PusherTransport = WsTransport<PusherCodec>;

impl SocketTransport {
    pub fn new(config: SocketConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_codec(config.url, SocketCodec, config.reconnect))
    }
}

impl PusherTransport {
    pub fn new(config: PusherConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_codec(config.url(), PusherCodec, config.reconnect))
    }
}

impl<C: FrameCodec> WsTransport<C> {
    pub fn with_codec(url: impl Into<String>, codec: C, policy: ReconnectPolicy) -> Self {
        Self {
            url: url.into(),
            codec: Arc::new(codec),
            policy,
            handle: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn lock(&self) -> MutexGuard<'_, Option<ConnectionHandle>> {
        self.handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn command(&self, command: Command) -> Result<()> {
        let guard = self.lock();
        let handle = guard.as_ref().ok_or(TransportError::NotConnected)?;
        handle.commands.send(command).map_err(|_| TransportError::Closed)
    }

    async fn shutdown(handle: ConnectionHandle) {
        let ConnectionHandle { commands, task, .. } = handle;
        let _ = commands.send(Command::Close);
        let abort = task.abort_handle();
        if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
            tracing::warn!("Connection task did not stop in time, aborting");
            abort.abort();
        }
    }
}

#[async_trait]
impl<C: FrameCodec> Transport for WsTransport<C> {
    async fn connect(&self) -> Result<mpsc::Receiver<TransportEvent>> {
        let previous = self.lock().take();
        if let Some(previous) = previous {
            tracing::debug!(transport = self.codec.name(), "Replacing existing connection");
            Self::shutdown(previous).await;
        }

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let driver = ConnectionDriver::new(
            self.url.clone(),
            Arc::clone(&self.codec),
            self.policy,
            events_tx,
            commands_rx,
            state_tx,
        );
        let task = tokio::spawn(driver.run());

        *self.lock() = Some(ConnectionHandle {
            commands: commands_tx,
            state: state_rx,
            task,
        });

        tracing::info!(transport = self.codec.name(), url = %self.url, "Transport connecting");
        Ok(events_rx)
    }

    async fn subscribe(&self, conversation_id: &str) -> Result<()> {
        self.command(Command::Subscribe(conversation_id.to_string()))
    }

    async fn unsubscribe(&self, conversation_id: &str) -> Result<()> {
        self.command(Command::Unsubscribe(conversation_id.to_string()))
    }

    async fn send(&self, frame: OutboundFrame) -> Result<()> {
        let text = self.codec.encode(&frame)?;
        if !self.state().is_connected() {
            return Err(TransportError::NotConnected);
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        self.command(Command::Send { text, ack: ack_tx })?;
        ack_rx.await.map_err(|_| TransportError::Closed)?
    }

    async fn disconnect(&self) -> Result<()> {
        let handle = self.lock().take();
        if let Some(handle) = handle {
            Self::shutdown(handle).await;
            tracing::info!(transport = self.codec.name(), "Transport disconnected");
        }
        Ok(())
    }

    fn supports_send(&self) -> bool {
        self.codec.can_send()
    }

    fn state(&self) -> ConnectionState {
        self.lock()
            .as_ref()
            .map(|handle| *handle.state.borrow())
            .unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        self.codec.name()
    }
}

impl<C: FrameCodec> Drop for WsTransport<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.lock().take() {
            handle.task.abort();
        }
    }
}
