//! Cloneable handle to a running controller

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use super::{ControllerError, ControllerEvent};
use crate::{
    protocol::{SettingsSnapshot, TimerUpdate, UpdateAck},
    state::{Badge, Settings},
};

/// Request/response access to the controller task plus its broadcasts
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    events: mpsc::Sender<ControllerEvent>,
    badge: watch::Receiver<Badge>,
    timer: broadcast::Sender<TimerUpdate>,
}

impl ControllerHandle {
    pub fn new(
        events: mpsc::Sender<ControllerEvent>,
        badge: watch::Receiver<Badge>,
        timer: broadcast::Sender<TimerUpdate>,
    ) -> Self {
        Self {
            events,
            badge,
            timer,
        }
    }

    /// `getSettings`
    pub async fn get_settings(&self) -> Result<SettingsSnapshot, ControllerError> {
        let (reply, response) = oneshot::channel();
        self.send(ControllerEvent::GetSettings { reply }).await?;
        response.await.map_err(|_| ControllerError::Unavailable)
    }

    /// `updateSettings`
    pub async fn update_settings(
        &self,
        enabled: bool,
        interval_minutes: u32,
    ) -> Result<UpdateAck, ControllerError> {
        let (reply, response) = oneshot::channel();
        self.send(ControllerEvent::UpdateSettings {
            settings: Settings::new(enabled, interval_minutes),
            reply,
        })
        .await?;
        response.await.map_err(|_| ControllerError::Unavailable)?
    }

    /// Tell the controller the host has just resumed from suspension
    pub async fn notify_resumed(&self) -> Result<(), ControllerError> {
        self.send(ControllerEvent::Resumed).await
    }

    /// Receive a `timerUpdate` for every tick from now on
    pub fn subscribe_timer(&self) -> broadcast::Receiver<TimerUpdate> {
        self.timer.subscribe()
    }

    pub fn badge(&self) -> Badge {
        self.badge.borrow().clone()
    }

    async fn send(&self, event: ControllerEvent) -> Result<(), ControllerError> {
        self.events
            .send(event)
            .await
            .map_err(|_| ControllerError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{agent::PageDirectory, controller::Controller, storage::MemoryStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn round_trips_through_the_controller_task() {
        let handle = Controller::spawn(Arc::new(MemoryStore::new()), PageDirectory::new());

        let ack = handle.update_settings(true, 5).await.unwrap();
        assert!(ack.success);

        let snapshot = handle.get_settings().await.unwrap();
        assert!(snapshot.is_enabled);
        assert_eq!(snapshot.interval, 5);
        assert_eq!(snapshot.remaining_seconds, 300);
        assert_eq!(handle.badge().text, "5:00");
    }

    #[tokio::test]
    async fn invalid_interval_comes_back_as_error() {
        let handle = Controller::spawn(Arc::new(MemoryStore::new()), PageDirectory::new());
        assert_eq!(
            handle.update_settings(true, 0).await,
            Err(ControllerError::InvalidInterval(0))
        );
    }

    #[tokio::test]
    async fn closed_queue_is_unavailable() {
        let (tx, rx) = mpsc::channel(1);
        let (_badge_tx, badge_rx) = watch::channel(Badge::blank());
        let (timer_tx, _) = broadcast::channel(1);
        drop(rx);

        let handle = ControllerHandle::new(tx, badge_rx, timer_tx);
        assert_eq!(handle.get_settings().await, Err(ControllerError::Unavailable));
    }
}
