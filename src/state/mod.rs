//! State management module
//!
//! This module contains the controller-owned state: persisted settings,
//! the ephemeral countdown and the badge rendering policy.

pub mod badge;
pub mod countdown;
pub mod settings;

// Re-export main types
pub use badge::{format_countdown, Badge, BadgeTier};
pub use countdown::Countdown;
pub use settings::{Settings, DEFAULT_INTERVAL_MINUTES, MIN_INTERVAL_MINUTES};
