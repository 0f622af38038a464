//! Bot handlers module
//!
//! The demo command tree served by the binary: a main menu with a counter,
//! an echo screen and an admin-only status screen.

pub mod commands;

pub use commands::{register_all, AdminCommand, CounterCommand, EchoCommand, MainMenuCommand};
