//! Background tasks module
//!
//! This module contains the long-running tasks: the controller event loop,
//! page agents, wake-up recovery and the console settings panel.

pub mod console_popup;
pub mod controller_loop;
pub mod page_agent;
pub mod wake_up_recovery;

// Re-export main functions
pub use console_popup::console_popup_task;
pub use controller_loop::controller_task;
pub use page_agent::page_agent_task;
pub use wake_up_recovery::wake_up_recovery_task;
