//! Controller event loop

use tokio::sync::mpsc;
use tracing::info;

use crate::controller::{Controller, ControllerEvent};

/// Drain the controller's event queue, one event at a time
pub async fn controller_task(
    mut controller: Controller,
    mut events: mpsc::Receiver<ControllerEvent>,
) {
    info!("Starting auto-save controller task");

    while let Some(event) = events.recv().await {
        controller.handle_event(event);
    }

    info!("Controller event queue closed, stopping");
}
