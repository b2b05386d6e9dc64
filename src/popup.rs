//! Settings panel
//!
//! A transient view over the controller: it reads the settings once when
//! opened, keeps two editable fields and re-renders its countdown for every
//! `timerUpdate` broadcast. Saving sends the fields as they are; the display
//! only changes when the next tick arrives.

use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    controller::{ControllerError, ControllerHandle},
    protocol::{TimerUpdate, UpdateAck},
    state::{format_countdown, BadgeTier},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PanelError {
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error("interval must be a whole number of minutes, got {0:?}")]
    InvalidInterval(String),
}

/// Rendered countdown, colored with the badge tiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownDisplay {
    pub text: String,
    pub background: &'static str,
    pub text_color: &'static str,
}

impl CountdownDisplay {
    /// The panel always shows a time, even while auto-save is off
    pub fn for_seconds(remaining_seconds: u64) -> Self {
        let tier = BadgeTier::for_seconds(remaining_seconds);
        Self {
            text: format_countdown(remaining_seconds),
            background: tier.background(),
            text_color: tier.text_color(),
        }
    }
}

/// Tick subscription of an open panel
#[derive(Debug)]
pub struct TimerUpdates {
    rx: broadcast::Receiver<TimerUpdate>,
}

impl TimerUpdates {
    /// Next tick, skipping over any that were missed. `None` once the
    /// controller is gone.
    pub async fn next(&mut self) -> Option<TimerUpdate> {
        loop {
            match self.rx.recv().await {
                Ok(update) => return Some(update),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// An open settings panel
#[derive(Debug)]
pub struct SettingsPanel {
    controller: ControllerHandle,
    enabled: bool,
    interval_minutes: u32,
    display: CountdownDisplay,
}

impl SettingsPanel {
    /// Open the panel: subscribe to ticks, then fetch the settings once
    pub async fn open(controller: ControllerHandle) -> Result<(Self, TimerUpdates), PanelError> {
        let updates = TimerUpdates {
            rx: controller.subscribe_timer(),
        };
        let snapshot = controller.get_settings().await?;

        let panel = Self {
            controller,
            enabled: snapshot.is_enabled,
            interval_minutes: snapshot.interval,
            display: CountdownDisplay::for_seconds(snapshot.remaining_seconds),
        };
        Ok((panel, updates))
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    pub fn display(&self) -> &CountdownDisplay {
        &self.display
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Edit the interval field from text input
    pub fn set_interval_text(&mut self, text: &str) -> Result<(), PanelError> {
        self.interval_minutes = text
            .trim()
            .parse()
            .map_err(|_| PanelError::InvalidInterval(text.to_string()))?;
        Ok(())
    }

    /// Submit the two fields as they are
    pub async fn save(&self) -> Result<UpdateAck, PanelError> {
        Ok(self
            .controller
            .update_settings(self.enabled, self.interval_minutes)
            .await?)
    }

    /// Re-render for a tick broadcast
    pub fn on_timer_update(&mut self, update: TimerUpdate) -> &CountdownDisplay {
        self.display = CountdownDisplay::for_seconds(update.remaining_seconds);
        &self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agent::PageDirectory,
        controller::Controller,
        state::Settings,
        storage::MemoryStore,
    };
    use std::sync::Arc;

    fn spawn_controller(settings: Settings) -> ControllerHandle {
        Controller::spawn(
            Arc::new(MemoryStore::with_settings(settings)),
            PageDirectory::new(),
        )
    }

    #[test]
    fn display_uses_badge_tiers() {
        assert_eq!(
            CountdownDisplay::for_seconds(0),
            CountdownDisplay {
                text: "0:00".to_string(),
                background: "#FF0000",
                text_color: "white",
            }
        );
        assert_eq!(CountdownDisplay::for_seconds(25).background, "#FFA500");
        assert_eq!(CountdownDisplay::for_seconds(90).text, "1:30");
    }

    #[tokio::test]
    async fn open_reads_current_settings() {
        let (panel, _updates) = SettingsPanel::open(spawn_controller(Settings::new(true, 2)))
            .await
            .unwrap();
        assert!(panel.enabled());
        assert_eq!(panel.interval_minutes(), 2);
        assert_eq!(panel.display().text, "2:00");
    }

    #[tokio::test]
    async fn save_submits_fields_without_optimistic_render() {
        let controller = spawn_controller(Settings::default());
        let (mut panel, _updates) = SettingsPanel::open(controller.clone()).await.unwrap();

        panel.set_enabled(true);
        panel.set_interval_text("5").unwrap();
        assert!(panel.save().await.unwrap().success);

        assert_eq!(panel.display().text, "0:00");
        assert_eq!(controller.get_settings().await.unwrap().remaining_seconds, 300);
    }

    #[tokio::test]
    async fn unparsable_interval_is_rejected_at_the_field() {
        let (mut panel, _updates) = SettingsPanel::open(spawn_controller(Settings::default()))
            .await
            .unwrap();
        assert_eq!(
            panel.set_interval_text("five"),
            Err(PanelError::InvalidInterval("five".to_string()))
        );
        assert_eq!(panel.interval_minutes(), 1);
    }

    #[tokio::test]
    async fn zero_interval_is_refused_by_the_controller() {
        let (mut panel, _updates) = SettingsPanel::open(spawn_controller(Settings::default()))
            .await
            .unwrap();
        panel.set_enabled(true);
        panel.set_interval_text("0").unwrap();
        assert_eq!(
            panel.save().await,
            Err(PanelError::Controller(ControllerError::InvalidInterval(0)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rerenders_on_each_tick() {
        let controller = spawn_controller(Settings::new(true, 1));
        let (mut panel, mut updates) = SettingsPanel::open(controller).await.unwrap();

        let update = updates.next().await.unwrap();
        assert_eq!(update.remaining_seconds, 59);
        assert_eq!(panel.on_timer_update(update).text, "0:59");
    }
}
