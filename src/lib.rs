//! Auto Save - periodically trigger a save action on a target page
//!
//! This library provides the auto-save controller with its countdown badge,
//! the page agent that performs the save, and the settings panel, all
//! talking over typed channels.

pub mod agent;
pub mod api;
pub mod config;
pub mod controller;
pub mod popup;
pub mod protocol;
pub mod services;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use config::Config;
pub use controller::{Controller, ControllerHandle};
pub use popup::SettingsPanel;
pub use state::{Badge, Settings};
pub use utils::signals::shutdown_signal;
