//! Controller
//!
//! The controller is the only owner of the settings and the countdown. It
//! runs as a single task draining one event queue, so requests, trigger
//! firings and ticks are handled one at a time and to completion.
//!
//! ```text
//!              update(enabled=true)
//!   Disabled ───────────────────────► Armed ──┐ trigger: save + reset
//!      ▲                                │  ▲   │ tick: count down to 0
//!      └──────── update(enabled=false) ─┘  └───┘ update(true, n): re-arm
//! ```

pub mod alarms;
pub mod handle;

pub use alarms::{AlarmFired, AlarmName, AlarmScheduler};
pub use handle::ControllerHandle;

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, oneshot, watch},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::{
    agent::PageDirectory,
    protocol::{AutoSaveResponse, SettingsSnapshot, TimerUpdate, UpdateAck},
    state::{Badge, Countdown, Settings},
    storage::SettingsStore,
    tasks::controller_task,
};

/// Period of the countdown tick alarm
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

const EVENT_QUEUE_CAPACITY: usize = 64;
const TIMER_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("interval must be at least one minute, got {0}")]
    InvalidInterval(u32),
    #[error("controller is not running")]
    Unavailable,
}

/// Everything the controller task reacts to
#[derive(Debug)]
pub enum ControllerEvent {
    GetSettings {
        reply: oneshot::Sender<SettingsSnapshot>,
    },
    UpdateSettings {
        settings: Settings,
        reply: oneshot::Sender<Result<UpdateAck, ControllerError>>,
    },
    Alarm(AlarmFired),
    /// The host process was suspended and has resumed
    Resumed,
}

/// Outcome of an `autoSave` request as observed by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAck {
    Saved,
    NotSaved,
    /// The agent dropped the request without answering (it is disabled)
    NoResponse,
}

impl SaveAck {
    fn from_reply(reply: Result<AutoSaveResponse, oneshot::error::RecvError>) -> Self {
        match reply {
            Ok(AutoSaveResponse { success: true }) => Self::Saved,
            Ok(AutoSaveResponse { success: false }) => Self::NotSaved,
            Err(_) => Self::NoResponse,
        }
    }
}

/// What happened to the `autoSave` message of a trigger firing
#[derive(Debug)]
pub enum TriggerDispatch {
    NoActivePage,
    /// The active page has no reachable agent
    Unreachable,
    /// Delivered; the handle resolves once the agent answers or drops it
    Sent(JoinHandle<SaveAck>),
}

pub struct Controller {
    settings: Settings,
    countdown: Countdown,
    store: Arc<dyn SettingsStore>,
    pages: PageDirectory,
    alarms: AlarmScheduler,
    badge_tx: watch::Sender<Badge>,
    /// Keep a receiver alive so badge updates are never rejected
    _badge_rx: watch::Receiver<Badge>,
    timer_tx: broadcast::Sender<TimerUpdate>,
}

impl Controller {
    /// Create a controller in the disabled shape. Alarm firings are queued
    /// on `events`.
    pub fn new(
        store: Arc<dyn SettingsStore>,
        pages: PageDirectory,
        events: mpsc::Sender<ControllerEvent>,
    ) -> Self {
        let (badge_tx, badge_rx) = watch::channel(Badge::blank());
        let (timer_tx, _) = broadcast::channel(TIMER_CHANNEL_CAPACITY);

        Self {
            settings: Settings::default(),
            countdown: Countdown::new(),
            store,
            pages,
            alarms: AlarmScheduler::new(events),
            badge_tx,
            _badge_rx: badge_rx,
            timer_tx,
        }
    }

    /// Build, initialize and run a controller on its own task
    pub fn spawn(store: Arc<dyn SettingsStore>, pages: PageDirectory) -> ControllerHandle {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let mut controller = Controller::new(store, pages, events_tx.clone());
        controller.initialize();

        let handle = controller.handle(events_tx);
        tokio::spawn(controller_task(controller, events_rx));
        handle
    }

    /// Handle for talking to this controller through `events`
    pub fn handle(&self, events: mpsc::Sender<ControllerEvent>) -> ControllerHandle {
        ControllerHandle::new(events, self.badge_tx.subscribe(), self.timer_tx.clone())
    }

    /// Load persisted settings and arm accordingly
    pub fn initialize(&mut self) {
        self.settings = self.load_settings();
        info!(
            "Controller initialized: enabled={}, interval={}min",
            self.settings.enabled, self.settings.interval_minutes
        );
        self.apply_settings();
    }

    /// Rebuild in-memory state after a host suspension. Settings come back
    /// from storage; alarms kept running, so only the countdown goes stale
    /// until the next tick.
    pub fn resume(&mut self) {
        self.settings = self.load_settings();
        self.countdown.mark_stale();
        self.update_badge();
        info!(
            "Controller resumed: enabled={}, interval={}min, countdown pending",
            self.settings.enabled, self.settings.interval_minutes
        );
    }

    fn load_settings(&self) -> Settings {
        match self.store.load() {
            Ok(stored) => stored.resolve(),
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn alarms(&self) -> &AlarmScheduler {
        &self.alarms
    }

    pub fn badge(&self) -> Badge {
        self.badge_tx.borrow().clone()
    }

    pub fn subscribe_timer(&self) -> broadcast::Receiver<TimerUpdate> {
        self.timer_tx.subscribe()
    }

    pub fn get_settings(&self) -> SettingsSnapshot {
        SettingsSnapshot::new(self.settings, self.countdown.remaining_seconds())
    }

    /// Store new settings and re-arm. Fails only on an interval below one
    /// minute; a failed storage write is logged and still acknowledged.
    pub fn update_settings(&mut self, settings: Settings) -> Result<UpdateAck, ControllerError> {
        if !settings.has_valid_interval() {
            warn!("Rejecting settings update with interval {}", settings.interval_minutes);
            return Err(ControllerError::InvalidInterval(settings.interval_minutes));
        }

        info!(
            "Updating settings: enabled={}, interval={}min",
            settings.enabled, settings.interval_minutes
        );
        self.settings = settings;
        if let Err(e) = self.store.save(settings) {
            warn!("Failed to persist settings: {}", e);
        }

        self.apply_settings();
        Ok(UpdateAck::ok())
    }

    /// Reconcile alarms and countdown with the current settings
    pub fn apply_settings(&mut self) {
        self.alarms.clear(AlarmName::AutoSave);

        if self.settings.enabled {
            let period = Duration::from_secs(self.settings.full_countdown_seconds());
            self.alarms.create(AlarmName::AutoSave, period);
            self.reset_countdown();
        } else {
            self.stop_countdown();
        }
    }

    fn reset_countdown(&mut self) {
        self.countdown.reset(self.settings.full_countdown_seconds());
        self.update_badge();
        // Re-creating keeps ticks in phase with the trigger
        self.alarms.create(AlarmName::Timer, TICK_PERIOD);
    }

    fn stop_countdown(&mut self) {
        self.alarms.clear(AlarmName::Timer);
        self.countdown.stop();
        self.update_badge();
    }

    /// Ask the active page to save, then restart the countdown
    pub fn on_trigger_fired(&mut self) -> TriggerDispatch {
        info!("Auto-save trigger fired");
        let dispatch = self.dispatch_auto_save();
        self.reset_countdown();
        dispatch
    }

    fn dispatch_auto_save(&self) -> TriggerDispatch {
        let Some(page) = self.pages.active() else {
            warn!("No active page to auto-save");
            return TriggerDispatch::NoActivePage;
        };

        let Some(agent) = page.agent() else {
            warn!(
                "Could not send message to page agent on {}: receiving end does not exist",
                page.url()
            );
            return TriggerDispatch::Unreachable;
        };

        match agent.request_auto_save() {
            Ok(response) => {
                let url = page.url().to_string();
                TriggerDispatch::Sent(tokio::spawn(async move {
                    let ack = SaveAck::from_reply(response.await);
                    match ack {
                        SaveAck::Saved => info!("Auto-save successful on {}", url),
                        SaveAck::NotSaved => info!("Auto-save failed or not possible on {}", url),
                        SaveAck::NoResponse => {
                            info!("Page agent on {} sent no response, auto-save skipped", url)
                        }
                    }
                    ack
                }))
            }
            Err(e) => {
                warn!("Could not send message to page agent on {}: {}", page.url(), e);
                TriggerDispatch::Unreachable
            }
        }
    }

    /// Count down one second and tell any open settings panel
    pub fn on_tick_fired(&mut self) {
        if self.countdown.is_stale() {
            self.reconcile_countdown();
            return;
        }

        if self.countdown.tick() {
            self.update_badge();
            self.broadcast_tick();
        }
    }

    /// Derive the countdown from the trigger's due time after a resume
    fn reconcile_countdown(&mut self) {
        let remaining = self
            .alarms
            .next_due(AlarmName::AutoSave)
            .map(|due| due.saturating_duration_since(Instant::now()))
            .map(|left| left.as_secs() + u64::from(left.subsec_nanos() > 0))
            .unwrap_or(0);

        self.countdown
            .reconcile(remaining, self.settings.full_countdown_seconds());
        debug!("Countdown reconciled to {}s", self.countdown.remaining_seconds());
        self.update_badge();
        self.broadcast_tick();
    }

    fn update_badge(&self) {
        let badge = Badge::render(self.countdown.remaining_seconds(), self.settings.enabled);
        if let Err(e) = self.badge_tx.send(badge) {
            warn!("Failed to update badge: {}", e);
        }
    }

    fn broadcast_tick(&self) {
        let update = TimerUpdate {
            remaining_seconds: self.countdown.remaining_seconds(),
        };
        // No open settings panel is the common case
        let _ = self.timer_tx.send(update);
    }

    pub fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::GetSettings { reply } => {
                if reply.send(self.get_settings()).is_err() {
                    debug!("getSettings requester went away");
                }
            }
            ControllerEvent::UpdateSettings { settings, reply } => {
                let result = self.update_settings(settings);
                if reply.send(result).is_err() {
                    debug!("updateSettings requester went away");
                }
            }
            ControllerEvent::Alarm(fired) => {
                if !self.alarms.is_current(&fired) {
                    debug!("Ignoring firing of replaced alarm {}", fired.name);
                    return;
                }
                match fired.name {
                    AlarmName::AutoSave => {
                        self.on_trigger_fired();
                    }
                    AlarmName::Timer => self.on_tick_fired(),
                }
            }
            ControllerEvent::Resumed => self.resume(),
        }
    }
}
