use anyhow::Context;
use attend_client::AttendClient;
use attend_sync::{ChatSession, SyncError};
use attend_types::{Conversation, Pagination, Role, VendorQuery};

use crate::command::{Command, HELP};
use crate::config::TransportKind;

/// What the REPL should do after a command
#[derive(Debug, PartialEq)]
pub enum Reply {
    Lines(Vec<String>),
    Quit,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Reply::Lines(vec![text.into()])
    }

    fn none() -> Self {
        Reply::Lines(Vec::new())
    }
}

/// Executes REPL commands against the backend and the chat session
pub struct App {
    client: AttendClient,
    session: ChatSession,
    backend: TransportKind,
    user_id: String,
}

impl App {
    /// `backend` selects which conversation endpoints pair with the session's
    /// transport: `/conversations` for the raw socket, `/chat` for Pusher.
    pub fn new(client: AttendClient, session: ChatSession, backend: TransportKind, user_id: impl Into<String>) -> Self {
        Self {
            client,
            session,
            backend,
            user_id: user_id.into(),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn execute(&self, command: Command) -> anyhow::Result<Reply> {
        tracing::debug!(command = ?command, "Executing command");

        match command {
            Command::New => {
                let conversation = self.create_conversation().await?;
                self.open(&conversation.id).await
            }
            Command::List => self.list().await,
            Command::Open(id) => self.open(&id).await,
            Command::More => {
                if self.session.conversation_id().is_none() {
                    return Ok(no_conversation());
                }
                match self.session.load_more().await.context("Failed to load older messages")? {
                    Some(pagination) => Ok(Reply::line(page_line(&pagination))),
                    None => Ok(Reply::line("No older messages")),
                }
            }
            Command::Reload => {
                if self.session.conversation_id().is_none() {
                    return Ok(no_conversation());
                }
                self.session.reload().await.context("Failed to reload messages")?;
                Ok(Reply::none())
            }
            Command::Health => match self.client.health().check().await {
                Ok(status) if status.is_ok() => Ok(Reply::line(format!(
                    "Backend ok{}",
                    status.service.map(|s| format!(" ({})", s)).unwrap_or_default()
                ))),
                Ok(status) => Ok(Reply::line(format!("Backend reported '{}'", status.status))),
                Err(e) => Ok(Reply::line(format!("Backend unavailable: {}", e))),
            },
            Command::Vendors(category) => {
                let query = match category {
                    Some(category) => VendorQuery::new().category(category),
                    None => VendorQuery::new(),
                };
                let page = self.client.vendors().list(&query).await.context("Failed to list vendors")?;
                if page.data.is_empty() {
                    return Ok(Reply::line("No vendors found"));
                }
                let mut lines: Vec<String> = page
                    .data
                    .iter()
                    .map(|vendor| {
                        let details = &vendor.details;
                        let mut line = format!(
                            "#{} {} [{}] rating {:.1}",
                            vendor.id,
                            details.name,
                            details.category.as_str(),
                            details.rating
                        );
                        if !details.location.city.is_empty() {
                            line.push_str(&format!(", {}", details.location.city));
                        }
                        line
                    })
                    .collect();
                if page.pagination.has_more() {
                    lines.push(page_line(&page.pagination));
                }
                Ok(Reply::Lines(lines))
            }
            Command::Bot => {
                let bot = self.client.bot_config().get().await.context("Failed to fetch bot configuration")?;
                let mut lines = vec![format!("System prompt: {}", bot.system_prompt)];
                for entry in &bot.context_data {
                    lines.push(format!("  context: {}", entry));
                }
                if !bot.personality.is_null() {
                    lines.push(format!("Personality: {}", bot.personality));
                }
                Ok(Reply::Lines(lines))
            }
            Command::Close => {
                self.session.unbind().await?;
                Ok(Reply::none())
            }
            Command::Help => Ok(Reply::Lines(HELP.lines().map(str::to_string).collect())),
            Command::Quit => Ok(Reply::Quit),
            Command::Say(text) => self.say(&text).await,
        }
    }

    async fn create_conversation(&self) -> anyhow::Result<Conversation> {
        let created = match self.backend {
            TransportKind::Socket => self.client.conversations().create(Some(&self.user_id), None).await,
            TransportKind::Pusher => self.client.chat().create_conversation(None, &self.user_id).await,
        };
        let conversation = created.context("Failed to create conversation")?;
        tracing::info!(conversation_id = %conversation.id, "Conversation created");
        Ok(conversation)
    }

    async fn list(&self) -> anyhow::Result<Reply> {
        let per_page = self.session.config().per_page;
        let conversations = match self.backend {
            TransportKind::Socket => self
                .client
                .conversations()
                .list(1, per_page, Some(&self.user_id))
                .await,
            TransportKind::Pusher => self
                .client
                .chat()
                .list_conversations(&self.user_id, 1, per_page)
                .await
                .map(|page| page.data),
        }
        .context("Failed to list conversations")?;

        if conversations.is_empty() {
            return Ok(Reply::line("No conversations yet, start one with /new"));
        }
        Ok(Reply::Lines(conversations.iter().map(conversation_line).collect()))
    }

    async fn open(&self, conversation_id: &str) -> anyhow::Result<Reply> {
        let mut lines = Vec::new();

        // History still loads over REST when the live feed cannot connect
        if let Err(e) = self.session.bind(Some(conversation_id), &self.user_id).await {
            match e {
                SyncError::Transport(e) => lines.push(format!("! live updates unavailable: {}", e)),
                other => return Err(other.into()),
            }
        }
        self.session
            .load_history(1)
            .await
            .with_context(|| format!("Failed to load conversation {}", conversation_id))?;

        Ok(Reply::Lines(lines))
    }

    async fn say(&self, text: &str) -> anyhow::Result<Reply> {
        match self.session.send(text, Role::User).await {
            Ok(Some(_)) => Ok(Reply::none()),
            Ok(None) if self.session.conversation_id().is_none() => Ok(no_conversation()),
            Ok(None) => Ok(Reply::none()),
            Err(e) => {
                let mut lines = vec![format!("! {}", e)];
                if let Some(content) = e.unsent_content() {
                    lines.push(format!("  not sent: {}", content));
                }
                Ok(Reply::Lines(lines))
            }
        }
    }
}

fn no_conversation() -> Reply {
    Reply::line("No conversation open, use /new or /open <id>")
}

fn page_line(pagination: &Pagination) -> String {
    format!("page {} of {}", pagination.current_page, pagination.last_page.max(1))
}

fn conversation_line(conversation: &Conversation) -> String {
    let updated = conversation
        .updated_at
        .or(conversation.created_at)
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    format!(
        "{:<24} {:>4} messages  {}",
        conversation.id, conversation.message_count, updated
    )
    .trim_end()
    .to_string()
}
