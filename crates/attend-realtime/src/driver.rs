// Background task that owns one WebSocket connection at a time and keeps it
// alive according to the reconnect policy.

use attend_types::{ConnectionState, TransportEvent};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::codec::{FrameCodec, Inbound};
use crate::config::ReconnectPolicy;
use crate::error::{Result, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;

pub(crate) enum Command {
    Subscribe(String),
    Unsubscribe(String),
    Send {
        text: String,
        ack: oneshot::Sender<Result<()>>,
    },
    Close,
}

enum Outcome {
    /// Stopped on request, or nobody listens anymore
    Shutdown,
    /// Connection dropped; `None` for a clean close by the remote end
    Lost(Option<TransportError>),
}

pub(crate) struct ConnectionDriver<C: FrameCodec> {
    url: String,
    codec: Arc<C>,
    policy: ReconnectPolicy,
    events: mpsc::Sender<TransportEvent>,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<ConnectionState>,
    /// Conversation to (re)subscribe to whenever the connection becomes ready
    subscription: Option<String>,
    ready: bool,
}

impl<C: FrameCodec> ConnectionDriver<C> {
    pub(crate) fn new(
        url: String,
        codec: Arc<C>,
        policy: ReconnectPolicy,
        events: mpsc::Sender<TransportEvent>,
        commands: mpsc::UnboundedReceiver<Command>,
        state: watch::Sender<ConnectionState>,
    ) -> Self {
        Self {
            url,
            codec,
            policy,
            events,
            commands,
            state,
            subscription: None,
            ready: false,
        }
    }

    pub(crate) async fn run(mut self) {
        let mut attempt: u32 = 0;

        loop {
            if !self.set_state(ConnectionState::Connecting, None).await {
                return;
            }

            tracing::debug!(transport = self.codec.name(), attempt, "Opening connection");
            match connect_async(self.url.as_str()).await {
                Ok((stream, _response)) => {
                    attempt = 0;
                    match self.drive(stream).await {
                        Outcome::Shutdown => {
                            self.set_state(ConnectionState::Disconnected, None).await;
                            tracing::info!(transport = self.codec.name(), "Connection closed");
                            return;
                        }
                        Outcome::Lost(None) => {
                            tracing::info!(transport = self.codec.name(), "Connection closed by remote end");
                            if !self.set_state(ConnectionState::Disconnected, None).await {
                                return;
                            }
                        }
                        Outcome::Lost(Some(error)) => {
                            tracing::warn!(transport = self.codec.name(), error = %error, "Connection lost");
                            if !self.set_state(ConnectionState::Error, None).await {
                                return;
                            }
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(transport = self.codec.name(), url = %self.url, error = %error, "Connection failed");
                    if !self.set_state(ConnectionState::Error, None).await {
                        return;
                    }
                }
            }

            attempt += 1;
            if !self.policy.allows(attempt) {
                tracing::warn!(transport = self.codec.name(), attempt, "Reconnect attempts exhausted");
                return;
            }

            let delay = self.policy.delay_for(attempt);
            tracing::debug!(transport = self.codec.name(), delay_ms = delay.as_millis() as u64, "Reconnecting after delay");
            if let Outcome::Shutdown = self.pause(delay).await {
                self.set_state(ConnectionState::Disconnected, None).await;
                return;
            }
        }
    }

    /// Pump frames and commands until the connection ends
    async fn drive(&mut self, stream: WsStream) -> Outcome {
        let (mut sink, mut source) = stream.split();
        self.ready = false;

        if self.codec.ready_on_open() {
            if let Err(outcome) = self.on_ready(&mut sink, None).await {
                return outcome;
            }
        }

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        let _ = sink.send(WsMessage::Close(None)).await;
                        return Outcome::Shutdown;
                    };
                    if let Err(outcome) = self.handle_command(&mut sink, command).await {
                        return outcome;
                    }
                }
                frame = source.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Err(outcome) = self.handle_text(&mut sink, &text).await {
                            return outcome;
                        }
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        tracing::debug!(close = ?frame, "Remote end sent close frame");
                        return Outcome::Lost(None);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => return Outcome::Lost(Some(error.into())),
                    None => return Outcome::Lost(None),
                }
            }
        }
    }

    async fn handle_command(&mut self, sink: &mut WsSink, command: Command) -> std::result::Result<(), Outcome> {
        match command {
            Command::Subscribe(conversation_id) => {
                if let Some(previous) = self.subscription.take().filter(|prev| *prev != conversation_id) {
                    self.write_unsubscribe(sink, &previous).await?;
                }
                self.subscription = Some(conversation_id.clone());
                if self.ready {
                    self.write_subscribe(sink, &conversation_id).await?;
                }
            }
            Command::Unsubscribe(conversation_id) => {
                if self.subscription.as_deref() == Some(conversation_id.as_str()) {
                    self.subscription = None;
                }
                self.write_unsubscribe(sink, &conversation_id).await?;
            }
            Command::Send { text, ack } => {
                if !self.ready {
                    let _ = ack.send(Err(TransportError::NotConnected));
                    return Ok(());
                }
                match sink.send(WsMessage::Text(text)).await {
                    Ok(()) => {
                        let _ = ack.send(Ok(()));
                    }
                    Err(error) => {
                        let _ = ack.send(Err(TransportError::Closed));
                        return Err(Outcome::Lost(Some(error.into())));
                    }
                }
            }
            Command::Close => {
                let _ = sink.send(WsMessage::Close(None)).await;
                return Err(Outcome::Shutdown);
            }
        }
        Ok(())
    }

    async fn handle_text(&mut self, sink: &mut WsSink, text: &str) -> std::result::Result<(), Outcome> {
        let inbound = match self.codec.decode(text) {
            Ok(inbound) => inbound,
            Err(error) => {
                tracing::warn!(transport = self.codec.name(), error = %error, "Dropping malformed frame");
                return Ok(());
            }
        };

        for item in inbound {
            match item {
                Inbound::Ready { connection_id } => self.on_ready(sink, connection_id).await?,
                Inbound::Identified { connection_id } => {
                    tracing::debug!(transport = self.codec.name(), connection_id = %connection_id, "Connection identified");
                }
                Inbound::Event(event) => {
                    if !self.emit(event).await {
                        return Err(Outcome::Shutdown);
                    }
                }
                Inbound::Reply(reply) => write(sink, reply).await?,
                Inbound::Ignored => {}
            }
        }
        Ok(())
    }

    async fn on_ready(&mut self, sink: &mut WsSink, connection_id: Option<String>) -> std::result::Result<(), Outcome> {
        self.ready = true;
        tracing::info!(transport = self.codec.name(), connection_id = ?connection_id, "Connection established");
        if !self.set_state(ConnectionState::Connected, connection_id).await {
            return Err(Outcome::Shutdown);
        }
        if let Some(conversation_id) = self.subscription.clone() {
            self.write_subscribe(sink, &conversation_id).await?;
        }
        Ok(())
    }

    async fn write_subscribe(&self, sink: &mut WsSink, conversation_id: &str) -> std::result::Result<(), Outcome> {
        match self.codec.subscribe(conversation_id) {
            Ok(Some(frame)) => {
                tracing::debug!(transport = self.codec.name(), conversation_id = %conversation_id, "Subscribing");
                write(sink, frame).await
            }
            Ok(None) => Ok(()),
            Err(error) => {
                tracing::warn!(error = %error, "Failed to encode subscribe frame");
                Ok(())
            }
        }
    }

    async fn write_unsubscribe(&self, sink: &mut WsSink, conversation_id: &str) -> std::result::Result<(), Outcome> {
        if !self.ready {
            return Ok(());
        }
        match self.codec.unsubscribe(conversation_id) {
            Ok(Some(frame)) => write(sink, frame).await,
            Ok(None) => Ok(()),
            Err(error) => {
                tracing::warn!(error = %error, "Failed to encode unsubscribe frame");
                Ok(())
            }
        }
    }

    /// Sleep between attempts while still accepting commands
    async fn pause(&mut self, delay: Duration) -> Outcome {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return Outcome::Lost(None),
                command = self.commands.recv() => match command {
                    None | Some(Command::Close) => return Outcome::Shutdown,
                    Some(Command::Subscribe(conversation_id)) => self.subscription = Some(conversation_id),
                    Some(Command::Unsubscribe(conversation_id)) => {
                        if self.subscription.as_deref() == Some(conversation_id.as_str()) {
                            self.subscription = None;
                        }
                    }
                    Some(Command::Send { ack, .. }) => {
                        let _ = ack.send(Err(TransportError::NotConnected));
                    }
                }
            }
        }
    }

    /// Publish a state change. Returns false once the consumer is gone.
    async fn set_state(&mut self, state: ConnectionState, connection_id: Option<String>) -> bool {
        if state != ConnectionState::Connected {
            self.ready = false;
        }
        let previous = self.state.send_replace(state);
        if previous == state && connection_id.is_none() {
            return true;
        }
        self.emit(TransportEvent::Connection { state, connection_id }).await
    }

    async fn emit(&self, event: TransportEvent) -> bool {
        if self.events.send(event).await.is_err() {
            tracing::debug!(transport = self.codec.name(), "Event receiver dropped, stopping connection");
            return false;
        }
        true
    }
}

async fn write(sink: &mut WsSink, text: String) -> std::result::Result<(), Outcome> {
    sink.send(WsMessage::Text(text))
        .await
        .map_err(|error| Outcome::Lost(Some(error.into())))
}
