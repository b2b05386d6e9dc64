//! External integrations module
//!
//! This module contains save controls that reach outside the process.

pub mod save_command;

// Re-export main types
pub use save_command::{check_shell_available, CommandSaveControl};
