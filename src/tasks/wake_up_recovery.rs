//! Wake-up recovery background task

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{interval, Instant};
use tracing::{debug, info, warn};

use crate::controller::ControllerHandle;

/// How often the clocks are compared
pub const CHECK_INTERVAL: Duration = Duration::from_secs(15);

/// Wall-clock lead over the monotonic clock that counts as a suspension
pub const SUSPENSION_THRESHOLD: Duration = Duration::from_secs(5);

/// Whether the wall clock ran ahead of the monotonic clock by more than
/// `threshold`. The monotonic clock stops while the host sleeps.
pub fn detect_suspension(
    wall_elapsed: chrono::Duration,
    monotonic_elapsed: Duration,
    threshold: Duration,
) -> bool {
    let Ok(wall_elapsed) = wall_elapsed.to_std() else {
        // Wall clock went backwards, e.g. an NTP correction
        return false;
    };
    wall_elapsed.saturating_sub(monotonic_elapsed) > threshold
}

/// Background task that detects host wake-up and tells the controller
pub async fn wake_up_recovery_task(controller: ControllerHandle) {
    info!("Starting wake-up recovery task");

    let mut interval = interval(CHECK_INTERVAL);
    let mut last_wall: DateTime<Utc> = Utc::now();
    let mut last_monotonic = Instant::now();

    loop {
        interval.tick().await;

        let now_wall = Utc::now();
        let now_monotonic = Instant::now();
        let suspended = detect_suspension(
            now_wall - last_wall,
            now_monotonic - last_monotonic,
            SUSPENSION_THRESHOLD,
        );
        last_wall = now_wall;
        last_monotonic = now_monotonic;

        if !suspended {
            continue;
        }

        info!("Host wake-up detected, rebuilding controller state");
        if let Err(e) = controller.notify_resumed().await {
            warn!("Failed to notify controller of wake-up: {}", e);
            debug!("Stopping wake-up recovery task");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_clocks_are_not_a_suspension() {
        assert!(!detect_suspension(
            chrono::Duration::seconds(15),
            Duration::from_secs(15),
            SUSPENSION_THRESHOLD
        ));
    }

    #[test]
    fn small_drift_is_tolerated() {
        assert!(!detect_suspension(
            chrono::Duration::seconds(19),
            Duration::from_secs(15),
            SUSPENSION_THRESHOLD
        ));
    }

    #[test]
    fn large_wall_clock_jump_is_a_suspension() {
        assert!(detect_suspension(
            chrono::Duration::minutes(30),
            Duration::from_secs(15),
            SUSPENSION_THRESHOLD
        ));
    }

    #[test]
    fn backwards_wall_clock_is_ignored() {
        assert!(!detect_suspension(
            chrono::Duration::seconds(-120),
            Duration::from_secs(15),
            SUSPENSION_THRESHOLD
        ));
    }
}
