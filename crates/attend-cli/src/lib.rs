//! Terminal front end for the attend chat backend.
//!
//! The binary wires an [`attend_client::AttendClient`], a real-time transport
//! and an [`attend_sync::ChatSession`] together from layered configuration,
//! then runs a line-oriented REPL.

pub mod app;
pub mod command;
pub mod config;
pub mod health;
pub mod render;

pub use app::{App, Reply};
pub use command::{Command, CommandError};
pub use config::{Config, TransportKind};
