// Turns successive session snapshots into terminal lines, printing only what
// changed since the previous snapshot.

use attend_sync::SessionSnapshot;
use attend_types::{ConnectionState, Message, MessageId, Role};
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct Renderer {
    conversation_id: Option<String>,
    shown: HashSet<MessageId>,
    /// Printed entries still under a local id; a later server copy of one
    /// is not printed again
    local: Vec<(MessageId, Role, String)>,
    connection: ConnectionState,
    typing: Vec<String>,
    last_error: Option<String>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&mut self, snapshot: &SessionSnapshot) -> Vec<String> {
        let mut lines = Vec::new();

        if snapshot.conversation_id != self.conversation_id {
            self.conversation_id = snapshot.conversation_id.clone();
            self.shown.clear();
            self.local.clear();
            self.typing.clear();
            self.last_error = None;
            match &self.conversation_id {
                Some(id) => lines.push(format!("-- conversation {} --", id)),
                None => lines.push("-- no conversation --".to_string()),
            }
        }

        if snapshot.connection != self.connection {
            self.connection = snapshot.connection;
            lines.push(format!("[{}]", self.connection));
        }

        let visible: HashSet<&MessageId> = snapshot.messages.iter().map(|m| &m.id).collect();
        for message in &snapshot.messages {
            if !self.shown.insert(message.id.clone()) {
                continue;
            }
            let sending = snapshot.is_pending(&message.id);
            if sending {
                // A resend supersedes rolled-back copies of the same text
                self.local
                    .retain(|(id, role, content)| visible.contains(id) || *role != message.role || *content != message.content);
            } else if self.take_replaced(message, &visible) {
                continue;
            }
            if message.id.is_local() {
                self.local
                    .push((message.id.clone(), message.role, message.content.clone()));
            }
            lines.push(format_message(message, sending));
        }
        // Forget rolled-back and replaced entries
        self.shown.retain(|id| visible.contains(id));

        if snapshot.typing_users != self.typing {
            self.typing = snapshot.typing_users.clone();
            if !self.typing.is_empty() {
                lines.push(format!("{} typing...", self.typing.join(", ")));
            }
        }

        if snapshot.last_error != self.last_error {
            self.last_error = snapshot.last_error.clone();
            if let Some(error) = &self.last_error {
                lines.push(format!("! {}", error));
            }
        }

        lines
    }

    /// Whether `message` is a new copy of a printed local entry that has
    /// since left the list
    fn take_replaced(&mut self, message: &Message, visible: &HashSet<&MessageId>) -> bool {
        let index = self.local.iter().position(|(id, role, content)| {
            !visible.contains(id) && *role == message.role && *content == message.content
        });
        let Some(index) = index else {
            return false;
        };
        if message.id.is_local() {
            self.local[index].0 = message.id.clone();
        } else {
            self.local.remove(index);
        }
        true
    }
}

pub fn format_message(message: &Message, sending: bool) -> String {
    let time = message
        .created_at
        .map(|at| at.with_timezone(&chrono::Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());
    let marker = if sending { " (sending)" } else { "" };
    format!("{} {:>9}: {}{}", time, message.role.as_str(), message.content, marker)
}
