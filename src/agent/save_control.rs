//! The page's save control, as seen by the agent

use tracing::info;

/// Something the agent can activate to save the page
pub trait SaveControl: Send + Sync {
    /// Locate the control and activate it. Returns false when it could not
    /// be found.
    fn activate(&self) -> bool;
}

/// Control that only records the activation in the log
#[derive(Debug, Clone, Default)]
pub struct LoggingSaveControl;

impl SaveControl for LoggingSaveControl {
    fn activate(&self) -> bool {
        info!("Save control activated");
        true
    }
}
