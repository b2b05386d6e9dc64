//! Named periodic alarms
//!
//! Each alarm slot holds at most one registration. Creating an alarm under a
//! name that is already registered replaces it, and every registration gets a
//! fresh generation so firings already queued by the replaced one can be told
//! apart and ignored.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

use super::ControllerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmName {
    /// Recurring save trigger
    AutoSave,
    /// One-second countdown tick
    Timer,
}

impl AlarmName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoSave => "autoSaveAlarm",
            Self::Timer => "timerAlarm",
        }
    }
}

impl fmt::Display for AlarmName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single alarm firing, delivered through the controller's event queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmFired {
    pub name: AlarmName,
    pub generation: u64,
}

struct AlarmSlot {
    generation: u64,
    period: Duration,
    next_due: Arc<Mutex<Instant>>,
    task: JoinHandle<()>,
}

impl Drop for AlarmSlot {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Alarm registrations owned by the controller
pub struct AlarmScheduler {
    events: mpsc::Sender<ControllerEvent>,
    slots: HashMap<AlarmName, AlarmSlot>,
    next_generation: u64,
}

impl AlarmScheduler {
    pub fn new(events: mpsc::Sender<ControllerEvent>) -> Self {
        Self {
            events,
            slots: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Register `name` to fire every `period`, first firing one period from
    /// now. Replaces any existing registration under that name.
    pub fn create(&mut self, name: AlarmName, period: Duration) {
        let generation = self.next_generation;
        self.next_generation += 1;

        let first_due = Instant::now() + period;
        let next_due = Arc::new(Mutex::new(first_due));
        let task = tokio::spawn(alarm_task(
            AlarmFired { name, generation },
            period,
            first_due,
            Arc::clone(&next_due),
            self.events.clone(),
        ));

        let slot = AlarmSlot {
            generation,
            period,
            next_due,
            task,
        };
        if self.slots.insert(name, slot).is_some() {
            debug!("Replaced alarm {} (period {:?})", name, period);
        } else {
            debug!("Created alarm {} (period {:?})", name, period);
        }
    }

    /// Remove the registration. Returns whether one existed.
    pub fn clear(&mut self, name: AlarmName) -> bool {
        let existed = self.slots.remove(&name).is_some();
        if existed {
            debug!("Cleared alarm {}", name);
        }
        existed
    }

    pub fn is_registered(&self, name: AlarmName) -> bool {
        self.slots.contains_key(&name)
    }

    pub fn period(&self, name: AlarmName) -> Option<Duration> {
        self.slots.get(&name).map(|slot| slot.period)
    }

    pub fn next_due(&self, name: AlarmName) -> Option<Instant> {
        self.slots
            .get(&name)
            .and_then(|slot| slot.next_due.lock().ok().map(|due| *due))
    }

    /// Whether a firing came from the live registration of its slot
    pub fn is_current(&self, fired: &AlarmFired) -> bool {
        self.slots
            .get(&fired.name)
            .map_or(false, |slot| slot.generation == fired.generation)
    }
}

async fn alarm_task(
    fired: AlarmFired,
    period: Duration,
    first_due: Instant,
    next_due: Arc<Mutex<Instant>>,
    events: mpsc::Sender<ControllerEvent>,
) {
    let mut interval = interval_at(first_due, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        if let Ok(mut due) = next_due.lock() {
            *due = Instant::now() + period;
        }

        if events.send(ControllerEvent::Alarm(fired)).await.is_err() {
            debug!("Controller is gone, stopping alarm {}", fired.name);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_alarm(rx: &mut mpsc::Receiver<ControllerEvent>) -> Option<AlarmFired> {
        match rx.try_recv() {
            Ok(ControllerEvent::Alarm(fired)) => Some(fired),
            _ => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_period() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut alarms = AlarmScheduler::new(tx);
        alarms.create(AlarmName::Timer, Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(next_alarm(&mut rx).is_none());

        tokio::time::sleep(Duration::from_millis(600)).await;
        let fired = next_alarm(&mut rx).unwrap();
        assert_eq!(fired.name, AlarmName::Timer);
        assert!(alarms.is_current(&fired));
        assert!(next_alarm(&mut rx).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn recreate_replaces_and_invalidates_old_firings() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut alarms = AlarmScheduler::new(tx);

        alarms.create(AlarmName::AutoSave, Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(61)).await;
        let old = next_alarm(&mut rx).unwrap();

        alarms.create(AlarmName::AutoSave, Duration::from_secs(300));
        assert!(!alarms.is_current(&old));
        assert_eq!(alarms.period(AlarmName::AutoSave), Some(Duration::from_secs(300)));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(next_alarm(&mut rx).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_stops_firing() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut alarms = AlarmScheduler::new(tx);
        alarms.create(AlarmName::Timer, Duration::from_secs(1));

        assert!(alarms.clear(AlarmName::Timer));
        assert!(!alarms.clear(AlarmName::Timer));
        assert!(!alarms.is_registered(AlarmName::Timer));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(next_alarm(&mut rx).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn next_due_tracks_the_schedule() {
        let (tx, _rx) = mpsc::channel(16);
        let mut alarms = AlarmScheduler::new(tx);
        let created = Instant::now();
        alarms.create(AlarmName::AutoSave, Duration::from_secs(60));

        assert_eq!(
            alarms.next_due(AlarmName::AutoSave),
            Some(created + Duration::from_secs(60))
        );
        assert_eq!(alarms.next_due(AlarmName::Timer), None);
    }

    #[test]
    fn names_match_the_runtime_alarm_names() {
        assert_eq!(AlarmName::AutoSave.to_string(), "autoSaveAlarm");
        assert_eq!(AlarmName::Timer.to_string(), "timerAlarm");
    }
}
