use attend_realtime::{
    OutboundFrame, PusherConfig, PusherTransport, ReconnectPolicy, SocketConfig, SocketTransport, Transport,
    TransportError,
};
use attend_types::{ConnectionState, MessageId, Role, TransportEvent, TypingEvent};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{accept_async, WebSocketStream};

const WAIT: Duration = Duration::from_secs(5);

async fn listen() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = tokio::time::timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    accept_async(stream).await.unwrap()
}

async fn next_json(ws: &mut WebSocketStream<TcpStream>) -> Value {
    loop {
        let frame = tokio::time::timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
        if let WsMessage::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send_json(ws: &mut WebSocketStream<TcpStream>, value: Value) {
    ws.send(WsMessage::Text(value.to_string())).await.unwrap();
}

async fn next_event(events: &mut mpsc::Receiver<TransportEvent>) -> TransportEvent {
    tokio::time::timeout(WAIT, events.recv()).await.unwrap().unwrap()
}

async fn wait_for_state(events: &mut mpsc::Receiver<TransportEvent>, expected: ConnectionState) {
    loop {
        if let TransportEvent::Connection { state, .. } = next_event(events).await {
            if state == expected {
                return;
            }
        }
    }
}

#[tokio::test]
async fn test_socket_transport_round_trip() {
    let (listener, port) = listen().await;
    let config = SocketConfig::new(format!("ws://127.0.0.1:{}", port)).with_reconnect(ReconnectPolicy::disabled());
    let transport = SocketTransport::new(config).unwrap();

    let mut events = transport.connect().await.unwrap();
    transport.subscribe("c1").await.unwrap();
    let mut server = accept(&listener).await;

    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::connection(ConnectionState::Connecting)
    );
    wait_for_state(&mut events, ConnectionState::Connected).await;
    assert_eq!(transport.state(), ConnectionState::Connected);

    let subscribe = next_json(&mut server).await;
    assert_eq!(subscribe, json!({"type": "setConversation", "conversationId": "c1"}));

    transport
        .send(OutboundFrame::chat("c1", "Plan a wedding", Role::User))
        .await
        .unwrap();
    let chat = next_json(&mut server).await;
    assert_eq!(chat["type"], "chat");
    assert_eq!(chat["content"], "Plan a wedding");

    send_json(
        &mut server,
        json!({"type": "chatResponse", "success": true, "response": "Congratulations!", "conversationId": "c1"}),
    )
    .await;
    match next_event(&mut events).await {
        TransportEvent::Message { message } => {
            assert_eq!(message.role, Role::Assistant);
            assert_eq!(message.content, "Congratulations!");
            assert!(message.id.is_local());
        }
        other => panic!("unexpected event {:?}", other),
    }

    send_json(&mut server, json!({"type": "error", "message": "model unavailable"})).await;
    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::RemoteError {
            message: "model unavailable".to_string()
        }
    );

    transport.disconnect().await.unwrap();
    assert_eq!(transport.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_socket_greeting_does_not_resubscribe() {
    let (listener, port) = listen().await;
    let config = SocketConfig::new(format!("ws://127.0.0.1:{}", port)).with_reconnect(ReconnectPolicy::disabled());
    let transport = SocketTransport::new(config).unwrap();

    let mut events = transport.connect().await.unwrap();
    transport.subscribe("c1").await.unwrap();
    let mut server = accept(&listener).await;
    wait_for_state(&mut events, ConnectionState::Connected).await;
    assert_eq!(next_json(&mut server).await["type"], "setConversation");

    send_json(&mut server, json!({"type": "connection", "connectionId": "abc"})).await;
    send_json(&mut server, json!({"type": "error", "message": "after greeting"})).await;

    // No second Connected event and no second setConversation frame
    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::RemoteError {
            message: "after greeting".to_string()
        }
    );
    transport
        .send(OutboundFrame::chat("c1", "hello", Role::User))
        .await
        .unwrap();
    assert_eq!(next_json(&mut server).await["type"], "chat");

    transport.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_send_requires_connection() {
    let transport = SocketTransport::new(SocketConfig::new("ws://127.0.0.1:9")).unwrap();
    let result = transport.send(OutboundFrame::chat("c1", "hi", Role::User)).await;
    assert!(matches!(result, Err(TransportError::NotConnected)));
}

#[tokio::test]
async fn test_unreachable_endpoint_reports_error() {
    let (listener, port) = listen().await;
    drop(listener);

    let config = SocketConfig::new(format!("ws://127.0.0.1:{}", port)).with_reconnect(ReconnectPolicy::disabled());
    let transport = SocketTransport::new(config).unwrap();
    let mut events = transport.connect().await.unwrap();

    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::connection(ConnectionState::Connecting)
    );
    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::connection(ConnectionState::Error)
    );
    // Reconnect disabled: the driver stops and the channel closes
    assert!(tokio::time::timeout(WAIT, events.recv()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_socket_reconnects_and_resubscribes() {
    let (listener, port) = listen().await;
    let config = SocketConfig::new(format!("ws://127.0.0.1:{}", port))
        .with_reconnect(ReconnectPolicy::fixed(Duration::from_millis(50)).with_max_attempts(3));
    let transport = SocketTransport::new(config).unwrap();

    let mut events = transport.connect().await.unwrap();
    transport.subscribe("c1").await.unwrap();

    let mut first = accept(&listener).await;
    wait_for_state(&mut events, ConnectionState::Connected).await;
    assert_eq!(next_json(&mut first).await["conversationId"], "c1");
    first.close(None).await.unwrap();

    wait_for_state(&mut events, ConnectionState::Disconnected).await;
    let mut second = accept(&listener).await;
    wait_for_state(&mut events, ConnectionState::Connected).await;
    assert_eq!(next_json(&mut second).await["conversationId"], "c1");

    transport.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_pusher_transport_subscribes_and_delivers() {
    let (listener, port) = listen().await;
    let config = PusherConfig::new("app-key", "eu")
        .with_host("127.0.0.1", port)
        .with_tls(false)
        .with_reconnect(ReconnectPolicy::disabled());
    let transport = PusherTransport::new(config).unwrap();

    let mut events = transport.connect().await.unwrap();
    transport.subscribe("c1").await.unwrap();
    let mut server = accept(&listener).await;

    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::connection(ConnectionState::Connecting)
    );
    // Not ready until the server establishes the session
    assert_eq!(transport.state(), ConnectionState::Connecting);

    send_json(
        &mut server,
        json!({"event": "pusher:connection_established", "data": "{\"socket_id\":\"1.2\",\"activity_timeout\":120}"}),
    )
    .await;
    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Connection {
            state: ConnectionState::Connected,
            connection_id: Some("1.2".to_string()),
        }
    );

    let subscribe = next_json(&mut server).await;
    assert_eq!(subscribe["event"], "pusher:subscribe");
    assert_eq!(subscribe["data"]["channel"], "conversation.c1");

    send_json(&mut server, json!({"event": "pusher:ping", "data": {}})).await;
    assert_eq!(next_json(&mut server).await["event"], "pusher:pong");

    send_json(
        &mut server,
        json!({
            "event": "message.sent",
            "channel": "conversation.c1",
            "data": json!({"id": 5, "role": "user", "content": "how are you?", "conversation_id": "c1"}).to_string(),
        }),
    )
    .await;
    match next_event(&mut events).await {
        TransportEvent::Message { message } => {
            assert_eq!(message.id, MessageId::Server(5));
            assert_eq!(message.content, "how are you?");
        }
        other => panic!("unexpected event {:?}", other),
    }

    send_json(
        &mut server,
        json!({
            "event": "user.typing",
            "channel": "conversation.c1",
            "data": "{\"user_id\":\"u2\",\"is_typing\":true}",
        }),
    )
    .await;
    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Typing(TypingEvent {
            user_id: "u2".to_string(),
            is_typing: true,
        })
    );

    transport.unsubscribe("c1").await.unwrap();
    let unsubscribe = next_json(&mut server).await;
    assert_eq!(unsubscribe["event"], "pusher:unsubscribe");

    let result = transport.send(OutboundFrame::chat("c1", "hi", Role::User)).await;
    assert!(matches!(result, Err(TransportError::Unsupported { .. })));

    transport.disconnect().await.unwrap();
}

#[test]
fn test_pusher_requires_key() {
    let result = PusherTransport::new(PusherConfig::new("", "eu"));
    assert!(matches!(result, Err(TransportError::InvalidConfig(_))));
}

#[test]
fn test_only_socket_transport_can_send() {
    let socket = SocketTransport::new(SocketConfig::new("ws://127.0.0.1:9")).unwrap();
    assert!(socket.supports_send());

    let pusher = PusherTransport::new(PusherConfig::new("app-key", "eu")).unwrap();
    assert!(!pusher.supports_send());
}
