// REPL input parsing. Anything that is not a slash command is chat text.

use attend_types::VendorCategory;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start a new conversation and open it
    New,
    List,
    Open(String),
    /// Next page of older history
    More,
    Reload,
    Health,
    Vendors(Option<VendorCategory>),
    Bot,
    Close,
    Help,
    Quit,
    Say(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Message is empty")]
    Empty,

    #[error("Unknown command '/{0}', try /help")]
    Unknown(String),

    #[error("/{command} needs {what}")]
    MissingArgument { command: &'static str, what: &'static str },

    #[error("{0}")]
    InvalidArgument(String),
}

pub const HELP: &str = "\
Commands:
  /new               start a new conversation
  /list              list your conversations
  /open <id>         open a conversation
  /more              load older messages
  /reload            reload the latest messages
  /health            check the backend
  /vendors [category] list vendors
  /bot               show the assistant configuration
  /close             leave the current conversation
  /help              show this help
  /quit              exit
Anything else is sent as a message.";

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Say(line.to_string()));
        };

        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let argument = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

        match name.as_str() {
            "new" => Ok(Command::New),
            "list" | "ls" => Ok(Command::List),
            "open" => argument
                .map(|id| Command::Open(id.to_string()))
                .ok_or(CommandError::MissingArgument {
                    command: "open",
                    what: "a conversation id",
                }),
            "more" => Ok(Command::More),
            "reload" => Ok(Command::Reload),
            "health" => Ok(Command::Health),
            "vendors" => match argument {
                Some(category) => category
                    .parse::<VendorCategory>()
                    .map(|category| Command::Vendors(Some(category)))
                    .map_err(CommandError::InvalidArgument),
                None => Ok(Command::Vendors(None)),
            },
            "bot" => Ok(Command::Bot),
            "close" => Ok(Command::Close),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(
            Command::parse("  I need a venue for 80 guests "),
            Ok(Command::Say("I need a venue for 80 guests".to_string()))
        );
    }

    #[test]
    fn test_blank_input_is_rejected() {
        assert_eq!(Command::parse("   "), Err(CommandError::Empty));
    }

    #[test]
    fn test_commands() {
        assert_eq!(Command::parse("/open conv_1"), Ok(Command::Open("conv_1".to_string())));
        assert_eq!(Command::parse("/QUIT"), Ok(Command::Quit));
        assert_eq!(
            Command::parse("/vendors catering"),
            Ok(Command::Vendors(Some(VendorCategory::Catering)))
        );
        assert_eq!(Command::parse("/vendors"), Ok(Command::Vendors(None)));
    }

    #[test]
    fn test_command_errors() {
        assert!(matches!(Command::parse("/open"), Err(CommandError::MissingArgument { .. })));
        assert!(matches!(Command::parse("/vendors spaceships"), Err(CommandError::InvalidArgument(_))));
        assert_eq!(Command::parse("/dance"), Err(CommandError::Unknown("dance".to_string())));
    }
}
