use attend_cli::{App, Command, Config, Reply, TransportKind};
use attend_client::{AttendClient, LegacyChatApi};
use attend_realtime::{PusherConfig, PusherTransport, ReconnectPolicy, SocketConfig, SocketTransport};
use attend_sync::{ChatSession, SendRoute, SessionConfig};
use attend_types::{MessageId, VendorCategory};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

// Nothing listens here; a long retry delay keeps the driver parked so
// subscriptions are accepted without a live socket.
fn parked_policy() -> ReconnectPolicy {
    ReconnectPolicy::fixed(Duration::from_secs(60))
}

fn socket_app(server: &ServerGuard, route: SendRoute) -> App {
    let client = AttendClient::with_base_url(server.url()).unwrap();
    let transport = SocketTransport::new(SocketConfig::new("ws://127.0.0.1:9").with_reconnect(parked_policy())).unwrap();
    let session = ChatSession::new(
        Arc::new(LegacyChatApi::new(client.clone())),
        Arc::new(transport),
        SessionConfig::new().route(route),
    )
    .unwrap();
    App::new(client, session, TransportKind::Socket, "user123")
}

fn pusher_app(server: &ServerGuard) -> App {
    let client = AttendClient::with_base_url(server.url()).unwrap();
    let config = PusherConfig::new("app-key", "eu")
        .with_host("127.0.0.1", 9)
        .with_tls(false)
        .with_reconnect(parked_policy());
    let session = ChatSession::new(
        Arc::new(client.clone()),
        Arc::new(PusherTransport::new(config).unwrap()),
        SessionConfig::new(),
    )
    .unwrap();
    App::new(client, session, TransportKind::Pusher, "user123")
}

fn lines(reply: Reply) -> Vec<String> {
    match reply {
        Reply::Lines(lines) => lines,
        Reply::Quit => panic!("unexpected quit"),
    }
}

async fn mock_legacy_history(server: &mut ServerGuard, conversation_id: &str) {
    server
        .mock("GET", format!("/conversations/{}", conversation_id).as_str())
        .with_status(200)
        .with_body(
            json!({
                "conversationId": conversation_id,
                "message_count": 2,
                "messages": [
                    {"id": 1, "role": "user", "content": "hello", "timestamp": "2024-05-01T10:00:00Z"},
                    {"id": 2, "role": "assistant", "content": "hi there", "timestamp": "2024-05-01T10:00:05Z"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;
}

#[tokio::test]
async fn test_open_loads_history_oldest_first() {
    let mut server = Server::new_async().await;
    mock_legacy_history(&mut server, "abc").await;
    let app = socket_app(&server, SendRoute::Transport);

    let reply = app.execute(Command::Open("abc".to_string())).await.unwrap();
    assert_eq!(lines(reply), Vec::<String>::new());

    assert_eq!(app.session().conversation_id().as_deref(), Some("abc"));
    assert_eq!(
        app.session().message_ids(),
        vec![MessageId::Server(1), MessageId::Server(2)]
    );
}

#[tokio::test]
async fn test_new_creates_and_opens_conversation() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/conversations")
        .match_body(Matcher::PartialJson(json!({"user_id": "user123"})))
        .with_status(201)
        .with_body(json!({"success": true, "data": {"conversation_id": "conv_9", "user_id": "user123"}}).to_string())
        .create_async()
        .await;
    mock_legacy_history(&mut server, "conv_9").await;
    let app = socket_app(&server, SendRoute::Transport);

    app.execute(Command::New).await.unwrap();

    create.assert_async().await;
    assert_eq!(app.session().conversation_id().as_deref(), Some("conv_9"));
    assert_eq!(app.session().messages().len(), 2);
}

#[tokio::test]
async fn test_list_uses_chat_endpoints_for_pusher() {
    let mut server = Server::new_async().await;
    let _list = server
        .mock("GET", "/chat/conversations")
        .match_query(Matcher::UrlEncoded("user_id".into(), "user123".into()))
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "data": {
                    "current_page": 1,
                    "data": [{"conversation_id": "conv_1", "user_id": "user123", "message_count": 4}],
                    "last_page": 1, "per_page": 50, "total": 1
                }
            })
            .to_string(),
        )
        .create_async()
        .await;
    let app = pusher_app(&server);

    let reply = lines(app.execute(Command::List).await.unwrap());
    assert_eq!(reply.len(), 1);
    assert!(reply[0].starts_with("conv_1"));
    assert!(reply[0].contains("4 messages"));
}

#[tokio::test]
async fn test_failed_send_hands_back_the_text() {
    let mut server = Server::new_async().await;
    mock_legacy_history(&mut server, "abc").await;
    let _chat = server
        .mock("POST", "/conversations/abc/chat")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;
    let app = socket_app(&server, SendRoute::Rest);
    app.execute(Command::Open("abc".to_string())).await.unwrap();
    let before = app.session().message_ids();

    let reply = lines(app.execute(Command::Say("need a venue".to_string())).await.unwrap());

    assert_eq!(reply.len(), 2);
    assert!(reply[0].starts_with("! "));
    assert_eq!(reply[1], "  not sent: need a venue");
    assert_eq!(app.session().message_ids(), before);
}

#[tokio::test]
async fn test_say_without_conversation() {
    let server = Server::new_async().await;
    let app = socket_app(&server, SendRoute::Transport);

    let reply = lines(app.execute(Command::Say("hello".to_string())).await.unwrap());
    assert_eq!(reply, vec!["No conversation open, use /new or /open <id>".to_string()]);
    assert!(app.session().messages().is_empty());
}

#[tokio::test]
async fn test_health_reports_unavailable_backend() {
    let mut server = Server::new_async().await;
    let _health = server
        .mock("GET", "/health")
        .with_status(503)
        .with_body("down")
        .create_async()
        .await;
    let app = socket_app(&server, SendRoute::Transport);

    let reply = lines(app.execute(Command::Health).await.unwrap());
    assert_eq!(reply.len(), 1);
    assert!(reply[0].starts_with("Backend unavailable"));
}

#[tokio::test]
async fn test_vendors_filtered_by_category() {
    let mut server = Server::new_async().await;
    let _vendors = server
        .mock("GET", "/vendors")
        .match_query(Matcher::UrlEncoded("category".into(), "catering".into()))
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "data": [
                    {"id": 3, "name": "Fork & Knife", "category": "catering", "rating": 4.7,
                     "location": {"city": "Lisbon"}}
                ],
                "pagination": {"current_page": 1, "last_page": 1, "per_page": 15, "total": 1}
            })
            .to_string(),
        )
        .create_async()
        .await;
    let app = socket_app(&server, SendRoute::Transport);

    let reply = lines(
        app.execute(Command::Vendors(Some(VendorCategory::Catering)))
            .await
            .unwrap(),
    );
    assert_eq!(reply, vec!["#3 Fork & Knife [catering] rating 4.7, Lisbon".to_string()]);
}

#[tokio::test]
async fn test_close_and_quit() {
    let mut server = Server::new_async().await;
    mock_legacy_history(&mut server, "abc").await;
    let app = socket_app(&server, SendRoute::Transport);
    app.execute(Command::Open("abc".to_string())).await.unwrap();

    app.execute(Command::Close).await.unwrap();
    assert_eq!(app.session().conversation_id(), None);
    assert!(app.session().messages().is_empty());

    assert_eq!(app.execute(Command::Quit).await.unwrap(), Reply::Quit);
}

#[test]
fn test_default_config_file_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml");
    let config = Config::from_file(path).unwrap();

    assert_eq!(config.api.base_url, "http://127.0.0.1:8000/api");
    assert_eq!(config.realtime.transport, TransportKind::Socket);
    assert_eq!(config.realtime.socket_config().url, "ws://127.0.0.1:8080");
    assert_eq!(config.session.route, SendRoute::Transport);
    assert_eq!(config.user.id, "user123");
    assert_eq!(config.health.interval_secs, 30);
}
