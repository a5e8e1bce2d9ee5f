//! traymux front end
//!
//! The supervisor core has no UI of its own. This crate provides the
//! terminal stand-in for the tray menu: one-shot subcommands that edit the
//! services file, and an interactive menu that starts, stops and toggles
//! services and redraws their labels when one exits on its own.

pub mod commands;
pub mod error;
pub mod menu;

pub use error::{CliError, Result};
pub use menu::{run_menu, MenuCommand};
