use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use attend_cli::{
    config::{Config, TransportKind},
    health,
    render::Renderer,
    App, Command, CommandError, Reply,
};
use attend_client::{AttendClient, ChatApi, LegacyChatApi};
use attend_realtime::{PusherTransport, SocketTransport, Transport};
use attend_sync::{ChatSession, SendRoute};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!(
        base_url = %config.api.base_url,
        transport = ?config.realtime.transport,
        user_id = %config.user.id,
        "Starting attend"
    );

    let client = AttendClient::new(config.api.clone()).context("Failed to build REST client")?;

    let mut session_config = config.session.clone();
    let (api, transport): (Arc<dyn ChatApi>, Arc<dyn Transport>) = match config.realtime.transport {
        TransportKind::Socket => {
            let transport = SocketTransport::new(config.realtime.socket_config())
                .context("Invalid socket transport configuration")?;
            (Arc::new(LegacyChatApi::new(client.clone())), Arc::new(transport))
        }
        TransportKind::Pusher => {
            let key = Config::pusher_key().map_err(|e| anyhow::anyhow!("{}", e))?;
            let transport = PusherTransport::new(config.realtime.pusher_config(&key))
                .context("Invalid Pusher configuration")?;
            if session_config.route == SendRoute::Transport {
                tracing::warn!("Pusher channels are receive-only, sending over REST instead");
                session_config.route = SendRoute::Rest;
            }
            (Arc::new(client.clone()), Arc::new(transport))
        }
    };

    let session = ChatSession::new(api, transport, session_config).context("Invalid session configuration")?;
    let app = App::new(client.clone(), session, config.realtime.transport, config.user.id.clone());

    let mut snapshots = app.session().watch();
    let render = tokio::spawn(async move {
        let mut renderer = Renderer::new();
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            for line in renderer.lines(&snapshot) {
                println!("{}", line);
            }
        }
    });

    let monitor = config.health.enabled.then(|| {
        let interval = Duration::from_secs(config.health.interval_secs.max(1));
        tokio::spawn(health::monitor(client.clone(), interval))
    });

    println!("attend {} - /help for commands", env!("CARGO_PKG_VERSION"));
    let result = run_repl(&app).await;

    if let Err(e) = app.session().unbind().await {
        tracing::warn!(error = %e, "Failed to close session");
    }
    if let Some(monitor) = monitor {
        monitor.abort();
    }
    render.abort();

    tracing::info!("Goodbye");
    result
}

async fn run_repl(app: &App) -> anyhow::Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = input.next_line() => line.context("Failed to read input")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            return Ok(());
        };

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match app.execute(command).await {
            Ok(Reply::Quit) => return Ok(()),
            Ok(Reply::Lines(lines)) => {
                for line in lines {
                    println!("{}", line);
                }
            }
            Err(e) => {
                tracing::debug!(error = ?e, "Command failed");
                println!("! {:#}", e);
            }
        }
    }
}

/// Logs go to stderr so they never interleave with the chat on stdout
fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
